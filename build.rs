// SPDX-License-Identifier: MIT

use std::io::Write;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // For each hid.bin file in our tests/data directory, create one test function
    // that runs every kind of parse session over that report descriptor
    let datadir: PathBuf = [concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data")]
        .iter()
        .collect();
    let out_dir = std::env::var_os("OUT_DIR").ok_or("OUT_DIR is not set")?;
    let dest_path = PathBuf::from(&out_dir).join("test-report-descriptors.rs");
    let mut file = std::fs::File::create(dest_path)?;

    println!("cargo:rerun-if-changed=tests/data");

    // The data files are not packaged, a missing directory means no tests
    let Ok(entries) = std::fs::read_dir(&datadir) else {
        return Ok(());
    };

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.to_string_lossy().ends_with(".hid.bin"))
        .collect();
    paths.sort();

    for path in paths {
        let Some(filename) = path.file_name().and_then(|f| f.to_str()) else {
            continue;
        };
        let funcname = filename.replace([':', '.', '-'], "_");
        writeln!(
            file,
            "
#[test]
#[allow(non_snake_case)]
fn test_{funcname}() {{
    let bytes: Vec<u8> = std::fs::read({path:?}).unwrap();
    check_descriptor(&bytes, {filename:?});
}}
"
        )?;
    }

    Ok(())
}
