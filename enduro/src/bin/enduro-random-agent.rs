use std::path::PathBuf;

use anyhow::{Context, Result};

use enduro::agent::RandomPolicy;
use enduro::control::{EpisodeController, EpisodeParameter};
use enduro::simulation::SyntheticRoad;
use enduro::vision::occupancy::DEFAULT_CELL_SIZE;

/// Plays two episodes with random moves.
/// An optional argument names a PNG file which receives the overlay of the last readable frame,
/// its occupancy grid goes next to it as `<name>-grid.png`.
fn main() -> Result<()> {
    ql::log::init_logging();

    let overlay_file = std::env::args().nth(1).map(PathBuf::from);
    let param = EpisodeParameter {
        episodes: 2,
        draw: overlay_file.is_some(),
        ..EpisodeParameter::default()
    };

    let mut controller = EpisodeController::new(SyntheticRoad::default(), param)?;
    let mut policy = RandomPolicy::new(123);
    controller.run(&mut policy)?;

    if let (Some(path), Some(image)) = (overlay_file, controller.last_image()) {
        image.save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("overlay written to {}", path.display());

        if let Some(grid) = controller.last_grid() {
            let stem = path.file_stem().map_or("overlay".into(), |s| s.to_string_lossy());
            let grid_path = path.with_file_name(format!("{}-grid.png", stem));
            grid.to_image(DEFAULT_CELL_SIZE)
                .save(&grid_path)
                .with_context(|| format!("failed to write {}", grid_path.display()))?;
        }
    }
    Ok(())
}
