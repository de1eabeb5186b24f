//! Tests for the FwConfig builder and kernel construction.

use fw_qf::{FaultPolicy, FwConfig, Kernel};

#[test]
fn fw_config_builder() {
    let config = FwConfig::builder()
        .name("TestFw")
        .max_hsm_count(32)
        .event_queue_capacity(16)
        .ms_per_tick(5)
        .verbosity(5)
        .fault_policy(FaultPolicy::Record)
        .build();

    assert_eq!(config.name, "TestFw");
    assert_eq!(config.max_hsm_count, 32);
    assert_eq!(config.event_queue_capacity, 16);
    assert_eq!(config.ms_per_tick, 5);
    assert_eq!(config.verbosity, 5);
    assert_eq!(config.fault_policy, FaultPolicy::Record);
}

#[test]
fn fw_config_default() {
    let config = FwConfig::default();

    assert_eq!(config.name, "FW");
    assert_eq!(config.max_hsm_count, 64);
    assert_eq!(config.event_queue_capacity, 64);
    assert_eq!(config.ms_per_tick, 10);
    assert_eq!(config.fault_policy, FaultPolicy::Panic);
    assert!(config.idle_callback.is_none());
}

#[test]
fn kernel_with_custom_config() {
    let config = FwConfig::builder().name("CustomFw").ms_per_tick(20).verbosity(1).build();

    let kernel = Kernel::builder(config).build().unwrap();

    assert_eq!(kernel.config().name, "CustomFw");
    assert_eq!(kernel.timer_wheel().ms_per_tick(), 20);
    assert_eq!(kernel.framework().log().verbosity(), 1);
    assert!(!kernel.has_events());
}

#[test]
fn kernel_rejects_zero_tick_period() {
    let config = FwConfig::builder().ms_per_tick(0).build();
    let err = Kernel::builder(config).build().err().unwrap();
    assert_eq!(err.to_string(), "invalid configuration: ms_per_tick must be non-zero");
}
