mod helpers;
mod test_gate;
mod test_pipeline;
mod test_targets;
