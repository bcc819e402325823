// iv: minimal GPU-rendered image viewer.
// Step through a directory of images with vim keys; a windowed cache keeps
// the current image, a one-step look-ahead and a bounded neighbourhood
// resident as GL textures.
// Usage: cargo run --release -- [OPTIONS] <PATH>

const VERSION: &str = env!("CARGO_PKG_VERSION");
const GIT_HASH: &str = env!("GIT_HASH");

mod cache;
mod files;
mod quad;
mod texture;

use std::path::PathBuf;

use clap::Parser;
use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::video::{FullscreenType, GLProfile, Window};

use cache::{CacheConfig, CacheEngine, Decoder, Direction, FilterMode, TextureBackend};
use texture::{FileDecoder, GlTextures};

#[derive(Parser, Debug)]
#[command(name = "iv", version, about = "iv — minimal GPU rendered image viewer")]
struct Cli {
    /// Image file or directory with images
    path: PathBuf,

    /// Background colour in hex, e.g. #ff00ff
    #[arg(short = 'b', long, value_parser = parse_hex_color)]
    background: Option<[f32; 3]>,

    /// Maximum number of cached images (this can use a lot of VRAM/RAM)
    #[arg(short = 'm', long, value_parser = parse_max_load)]
    max_loaded_images: Option<usize>,

    /// Use nearest texture filtering (good for pixel art)
    #[arg(short = 'n', long)]
    filter_nearest: bool,

    /// Reverse the sorting order
    #[arg(short = 'r', long)]
    reverse: bool,

    /// Sort images by the chosen method [not implemented]
    #[arg(short = 's', long, value_parser = parse_sort)]
    sort: Option<String>,

    /// Disable preloading the next image (saves VRAM/RAM but is slower)
    #[arg(long)]
    disable_preload: bool,
}

fn parse_hex_color(value: &str) -> Result<[f32; 3], String> {
    let hex = value.strip_prefix('#').unwrap_or(value);
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("{} is not a valid hex color code", value));
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap() as f32 / 255.0;
    Ok([channel(0), channel(2), channel(4)])
}

fn parse_max_load(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(format!("{} is not an integer greater than 0", value)),
    }
}

fn parse_sort(_value: &str) -> Result<String, String> {
    Err("sorting is not yet implemented".into())
}

fn main() {
    let args = Cli::parse();

    let paths = files::collect_image_paths(&args.path, args.reverse);
    if paths.is_empty() {
        eprintln!("No images at provided path");
        std::process::exit(1);
    }
    eprintln!("{}: {} images", args.path.display(), paths.len());

    let preload = !args.disable_preload;
    let filter = if args.filter_nearest {
        FilterMode::Nearest
    } else {
        FilterMode::LinearMipmap
    };
    let config = CacheConfig::resolve(args.max_loaded_images, preload, filter);
    let clear = args.background.unwrap_or([0.3, 0.3, 0.3]);

    // ── SDL2 + OpenGL ───────────────────────────────────────────────────
    let sdl = sdl2::init().expect("SDL2 init failed");
    let video = sdl.video().expect("SDL2 video init failed");

    let gl_attr = video.gl_attr();
    gl_attr.set_context_profile(GLProfile::Core);
    gl_attr.set_context_version(3, 3);

    let mut window = video
        .window("iv", 800, 600)
        .opengl()
        .resizable()
        .position_centered()
        .build()
        .expect("Failed to create window");

    let _gl_ctx = window.gl_create_context().expect("GL context failed");
    window
        .gl_make_current(&_gl_ctx)
        .expect("GL make_current failed");
    video.gl_set_swap_interval(1).ok();

    gl::load_with(|name| video.gl_get_proc_address(name) as *const _);

    let quad_renderer = quad::QuadRenderer::new();

    // ── Cache engine ────────────────────────────────────────────────────
    // Loads the first image synchronously; a collection whose first image
    // cannot be decoded is fatal at startup.
    let mut engine = match CacheEngine::new(paths, config, FileDecoder, GlTextures) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("iv: {}", e);
            std::process::exit(1);
        }
    };
    update_title(&mut window, &engine);

    // ── Main loop ───────────────────────────────────────────────────────
    let mut event_pump = sdl.event_pump().expect("Failed to create event pump");
    let mut running = true;

    while running {
        for event in event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => running = false,

                // repeat: false — holding a key navigates once, not per frame
                Event::KeyDown {
                    keycode: Some(key),
                    repeat: false,
                    ..
                } => {
                    let step = match key {
                        Keycode::Q | Keycode::Escape => {
                            running = false;
                            None
                        }
                        Keycode::J | Keycode::L => Some(Direction::Forward),
                        Keycode::K | Keycode::H => Some(Direction::Backward),
                        Keycode::F => {
                            toggle_fullscreen(&mut window);
                            None
                        }
                        _ => None,
                    };
                    if let Some(dir) = step {
                        if let Err(e) = engine.navigate(dir) {
                            eprintln!("iv: {}", e);
                            std::process::exit(1);
                        }
                        update_title(&mut window, &engine);
                        #[cfg(debug_assertions)]
                        eprintln!(
                            "[{:>4}/{}] resident {:?}  {}",
                            engine.cursor() + 1,
                            engine.len(),
                            engine.resident_indices(),
                            engine.current_path(),
                        );
                    }
                }

                _ => {}
            }
        }

        // Prefetch + evict, every frame
        engine.maintain();

        // ── Render ──────────────────────────────────────────────────────
        let (w, h) = window.drawable_size();
        unsafe {
            gl::Viewport(0, 0, w as i32, h as i32);
            gl::ClearColor(clear[0], clear[1], clear[2], 1.0);
            gl::Clear(gl::COLOR_BUFFER_BIT);
        }
        if let Some((&tex, img_w, img_h)) = engine.current() {
            quad_renderer.draw(tex, img_w, img_h, w, h);
        }
        window.gl_swap_window();
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn update_title<D, B>(window: &mut Window, engine: &CacheEngine<D, B>)
where
    D: Decoder,
    B: TextureBackend,
{
    let path = engine.current_path();
    let filename = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let title = format!(
        "[{}/{}] {} — iv {}-{}",
        engine.cursor() + 1,
        engine.len(),
        filename,
        VERSION,
        GIT_HASH,
    );
    window.set_title(&title).ok();
}

fn toggle_fullscreen(window: &mut Window) {
    let next = if window.fullscreen_state() == FullscreenType::Off {
        FullscreenType::Desktop
    } else {
        FullscreenType::Off
    };
    window.set_fullscreen(next).ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── hex colour parsing ──────────────────────────────────────────────

    #[test]
    fn hex_color_with_and_without_hash() {
        assert_eq!(parse_hex_color("#ff00ff").unwrap(), [1.0, 0.0, 1.0]);
        assert_eq!(parse_hex_color("ff00ff").unwrap(), [1.0, 0.0, 1.0]);
        assert_eq!(parse_hex_color("000000").unwrap(), [0.0, 0.0, 0.0]);
        assert_eq!(parse_hex_color("FFFFFF").unwrap(), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn hex_color_channel_scaling() {
        let [r, g, b] = parse_hex_color("#ff0080").unwrap();
        assert_eq!(r, 1.0);
        assert_eq!(g, 0.0);
        assert!((b - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn hex_color_invalid_rejected() {
        for bad in ["", "12345", "1234567", "xyzxyz", "#12345", "##ff00ff"] {
            assert!(parse_hex_color(bad).is_err(), "{:?} should be rejected", bad);
        }
    }

    // ── max-load parsing ────────────────────────────────────────────────

    #[test]
    fn max_load_accepts_positive_integers() {
        assert_eq!(parse_max_load("1").unwrap(), 1);
        assert_eq!(parse_max_load("20").unwrap(), 20);
    }

    #[test]
    fn max_load_rejects_everything_else() {
        for bad in ["0", "-3", "abc", "1.5", ""] {
            assert!(parse_max_load(bad).is_err(), "{:?} should be rejected", bad);
        }
    }

    // ── CLI surface ─────────────────────────────────────────────────────

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["iv", "pics"]).unwrap();
        assert_eq!(cli.path, PathBuf::from("pics"));
        assert!(cli.background.is_none());
        assert!(cli.max_loaded_images.is_none());
        assert!(!cli.filter_nearest);
        assert!(!cli.reverse);
        assert!(!cli.disable_preload);
    }

    #[test]
    fn cli_flags_parse() {
        let cli = Cli::try_parse_from([
            "iv",
            "-n",
            "-r",
            "--disable-preload",
            "-m",
            "8",
            "-b",
            "ff00ff",
            "pics",
        ])
        .unwrap();
        assert!(cli.filter_nearest);
        assert!(cli.reverse);
        assert!(cli.disable_preload);
        assert_eq!(cli.max_loaded_images, Some(8));
        assert_eq!(cli.background, Some([1.0, 0.0, 1.0]));
    }

    #[test]
    fn cli_sort_is_rejected() {
        assert!(Cli::try_parse_from(["iv", "-s", "alpha", "pics"]).is_err());
    }

    #[test]
    fn cli_zero_max_load_is_rejected() {
        assert!(Cli::try_parse_from(["iv", "-m", "0", "pics"]).is_err());
    }
}
