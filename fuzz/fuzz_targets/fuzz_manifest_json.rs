#![no_main]

use libfuzzer_sys::fuzz_target;
use lithium_core::json::{from_json, from_json_slice, to_json};
use lithium_manifest::ManifestDocument;

fuzz_target!(|data: &[u8]| {
    let Ok(parsed) = from_json_slice::<ManifestDocument>(data) else { return };

    // A manifest that parsed once must serialize back to something that
    // parses again with the same name/version/dependency set.
    let Ok(json_str) = to_json(&parsed) else { return };
    let reparsed: ManifestDocument = from_json(&json_str).expect("round-tripped manifest must reparse");

    assert_eq!(parsed.name, reparsed.name);
    assert_eq!(parsed.version, reparsed.version);
    assert_eq!(parsed.dependencies, reparsed.dependencies);
    assert_eq!(parsed.modules, reparsed.modules);
});
