use limno_nc::mitgcm::MitgcmRun;
use limno_plot::{
    animate::{make_animation, AnimationConfig},
    colormap::{available_colormaps, get_colormap},
};
use log::{info, warn};

pub fn run_animate(config: &AnimationConfig) -> anyhow::Result<()> {
    let source = MitgcmRun::new(&config.namespec);
    let output = make_animation(&source, config)?;
    if !output.skipped.is_empty() {
        warn!("Skipped {} unreadable iterations: {:?}", output.skipped.len(), output.skipped);
    }
    info!("Wrote {} frames to {}", output.frames, output.gif.display());
    Ok(())
}

/// Print one colormap's name, or every available map when none is given.
pub fn run_colormap(name: Option<&str>) -> anyhow::Result<()> {
    for line in colormap_lines(name)? {
        println!("{}", line);
    }
    Ok(())
}

fn colormap_lines(name: Option<&str>) -> anyhow::Result<Vec<String>> {
    match name {
        Some(spec) => {
            let cmap = get_colormap(spec)?;
            Ok(vec![format!("{} -> {}", spec, cmap.name)])
        }
        None => Ok(available_colormaps()),
    }
}
