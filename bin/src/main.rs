#[macro_use]
extern crate log;

mod app;

use app::*;
use clap::Parser;
use filters::GaussianFilter;
use samplers::*;
use std::sync::Arc;
use texcore::error::*;
use texcore::geometry::Point2f;
use texcore::image_io::ImageFileOpener;
use texcore::memory::MemorySentry;
use texcore::texfile::{TextureFileOpener, WrapMode};

fn main() {
    // Initialize `env_logger`.
    env_logger::init();

    let options = Options::parse();
    if let Err(e) = run(&options) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(options: &Options) -> TexResult<()> {
    let opener: Arc<dyn TextureFileOpener> = Arc::new(
        ImageFileOpener::new(Arc::new(GaussianFilter), 2.0).with_wrap_modes(
            options.swrap.unwrap_or(WrapMode::Clamp),
            options.twrap.unwrap_or(WrapMode::Clamp),
        ),
    );
    let search_path = options.search_path.clone();
    let cache = TextureCache::new(
        opener.clone(),
        Box::new(move || search_path.clone()),
        Arc::new(MemorySentry::new(options.max_memory)),
    );

    match &options.command {
        Command::Info { file } => {
            let path = cache.resolve(file);
            let texture = opener.open(&path)?;
            println!("file:       {path}");
            println!("subimages:  {}", texture.num_subimages());
            let header = texture.header(0);
            println!("format:     {}", header.texture_format());
            if let Some((s, t)) = header.wrap_modes() {
                println!("wrap modes: {s} {t}");
            }
            let (tw, th) = header.tile_size();
            println!("tile size:  {tw} x {th}");
            print!("{header}");
        }

        Command::Sample { file, s, t, ds, dt } => {
            let sampler = cache.find_texture_sampler(file);
            let mut sample_options = sampler.default_sample_options();
            sample_options.filter_type = options.filter;
            sample_options.s_blur = options.blur;
            sample_options.t_blur = options.blur;
            sample_options.s_width = options.width;
            sample_options.t_width = options.width;
            if let Some(wrap) = options.swrap {
                sample_options.s_wrap = wrap;
            }
            if let Some(wrap) = options.twrap {
                sample_options.t_wrap = wrap;
            }

            let mut out = vec![0.0; sample_options.num_channels];
            let footprint = SamplePllgram::from_extents(Point2f::new(*s, *t), *ds, *dt);
            sampler.sample_pllgram(&footprint, &sample_options, &mut out)?;
            let values: Vec<String> = out.iter().map(|v| format!("{v}")).collect();
            println!("{}", values.join(" "));
            debug!("Tile memory in use: {} bytes", cache.sentry().total_memory());
        }
    }

    Ok(())
}
