pub mod action;
pub mod agent;
pub mod control;
pub mod emulator;
pub mod simulation;
pub mod vision;

#[cfg(test)]
#[ctor::ctor]
fn init() {
    ql::log::try_init_logging(log::LevelFilter::Debug)
}
