#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    let Ok(cfg) = toml::from_str::<vwcar_config::Config>(data) else {
        return;
    };
    if cfg.validate().is_err() {
        return;
    }
    // A validated config either builds a session or reports a BuildError.
    if let Err(e) = vwcar_core::Session::from_config(&cfg) {
        assert!(e.downcast_ref::<vwcar_core::BuildError>().is_some());
    }
});
