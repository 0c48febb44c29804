use std::{env, error::Error, path::PathBuf, process};

use winit::{event_loop::EventLoop, window::WindowBuilder};

use surfer_game::{
    gpu::HeadlessDevice,
    mesh::{Mesh, MeshData, MeshSource},
    shapes, GameConfig,
};
use surfer_renderer::{clock::SystemClock, State};

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    character: Option<PathBuf>,
    export: Option<PathBuf>,
    backends: Option<wgpu::Backends>,
}

fn print_help() {
    println!("Usage: surfer [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>     Load game settings from a JSON file");
    println!("  -m, --character <PATH>  Use an OBJ mesh as the player character");
    println!("  -e, --export <PATH>     Write the character mesh as OBJ and exit");
    println!("      --backend <NAME>    Graphics backend: gl, vulkan, metal, dx12, primary");
    println!("  -h, --help              Show this message");
}

fn parse_args() -> Result<Args, String> {
    let mut args = env::args().skip(1);
    let mut parsed = Args::default();

    while let Some(arg) = args.next() {
        let mut value = |name: &str| {
            args.next()
                .ok_or_else(|| format!("Missing value for {name}"))
        };
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                process::exit(0);
            }
            "-c" | "--config" => parsed.config = Some(value("--config")?.into()),
            "-m" | "--character" => parsed.character = Some(value("--character")?.into()),
            "-e" | "--export" => parsed.export = Some(value("--export")?.into()),
            "--backend" => {
                let name = value("--backend")?;
                parsed.backends = Some(match name.to_lowercase().as_str() {
                    "gl" => wgpu::Backends::GL,
                    "vulkan" => wgpu::Backends::VULKAN,
                    "metal" => wgpu::Backends::METAL,
                    "dx12" => wgpu::Backends::DX12,
                    "primary" => wgpu::Backends::PRIMARY,
                    other => return Err(format!("Unknown backend: {other}")),
                });
            }
            other => return Err(format!("Unknown argument: {other}")),
        }
    }

    Ok(parsed)
}

fn load_character(path: Option<&PathBuf>) -> surfer_game::Result<MeshData> {
    match path {
        Some(path) => {
            log::info!("Loading character mesh from {}", path.display());
            MeshData::from_source(&MeshSource::load_obj(path)?)
        }
        None => Ok(shapes::cube()),
    }
}

#[pollster::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("Error: {message}");
            print_help();
            process::exit(2);
        }
    };

    let config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    let character = load_character(args.character.as_ref())?;

    if let Some(path) = &args.export {
        let mesh = Mesh::new(character, &mut HeadlessDevice::new())?;
        mesh.export_obj(path)?;
        return Ok(());
    }

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new().with_title("Surfer").build(&event_loop)?;

    let backends = args.backends.unwrap_or(wgpu::Backends::PRIMARY);
    let mut state = State::new(&window, backends, SystemClock, config, character).await?;

    state.run(event_loop)?;
    Ok(())
}
