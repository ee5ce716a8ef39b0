#![no_main]

use libfuzzer_sys::fuzz_target;
use lithium_version::{Constraint, Version};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else { return };

    let Ok(constraint) = Constraint::parse(s) else { return };

    let test_versions = [
        Version::new(0, 0, 0),
        Version::new(0, 0, 1),
        Version::new(0, 1, 0),
        Version::new(1, 0, 0),
        Version::new(1, 2, 3),
        Version::new(2, 0, 0),
        Version::new(10, 20, 30),
        Version::new(99, 99, 99),
    ];

    for version in &test_versions {
        // Should never panic regardless of the constraint's operator/version.
        let _ = constraint.matches(version);
    }

    let reparsed = Constraint::parse(s).expect("same input parsed twice must agree");
    assert_eq!(constraint, reparsed);
});
