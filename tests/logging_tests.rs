use recap::setup_logging;

#[test]
fn test_logging_setup() {
    // Only checks that installing the subscriber does not panic.
    let result = std::panic::catch_unwind(|| {
        setup_logging();
    });

    assert!(result.is_ok(), "setup_logging function should not panic");
}
