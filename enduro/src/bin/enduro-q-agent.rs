use anyhow::Result;

use enduro::agent::{QLearningParameter, QLearningPolicy};
use enduro::control::{EpisodeController, EpisodeParameter};
use enduro::simulation::SyntheticRoad;
use ql::util::format::format_count;

const TRAINING_EPISODES: usize = 5;

/// Learns for a couple of episodes, then plays one greedy episode with the learned table.
fn main() -> Result<()> {
    ql::log::init_logging();

    let mut policy = QLearningPolicy::new(QLearningParameter::default());

    let training = EpisodeParameter {
        episodes: TRAINING_EPISODES,
        learn: true,
        ..EpisodeParameter::default()
    };
    let mut controller = EpisodeController::new(SyntheticRoad::default(), training)?;
    controller.run(&mut policy)?;
    log::info!(
        "learned {} states, epsilon is down to {:.3}",
        format_count(policy.table().len()),
        policy.epsilon()
    );

    policy.set_greedy();
    let evaluation = EpisodeParameter::default();
    let mut controller = EpisodeController::new(controller.into_emulator(), evaluation)?;
    let summaries = controller.run(&mut policy)?;
    log::info!("Total reward: {}", summaries[0].total_reward);
    log::info!("learning curve: {:?}", policy.episode_rewards());

    for (state, value) in policy.table().states_sorted_by_value().into_iter().take(5) {
        log::info!("{:?}: {:.3}", state, value);
    }
    Ok(())
}
