use anyhow::Result;

use enduro::agent::PolicyKind;
use enduro::control::{EpisodeController, EpisodeParameter};
use enduro::simulation::SyntheticRoad;

/// Drive yourself: `w` accelerate, `s` brake, `a`/`d` steer, space does nothing, `Esc` quits.
fn main() -> Result<()> {
    ql::log::init_logging();

    let mut policy = PolicyKind::Keyboard.build()?;
    let mut controller = EpisodeController::new(SyntheticRoad::default(), EpisodeParameter::default())?;
    let summaries = controller.run(policy.as_mut())?;

    log::info!("Total reward: {}", summaries[0].total_reward);
    Ok(())
}
