use std::env;
use std::path::PathBuf;

/// Environment variables set by the NDI runtime installers, newest first.
const RUNTIME_DIR_VARS: [&str; 2] = ["NDI_RUNTIME_DIR_V6", "NDI_RUNTIME_DIR_V5"];

#[cfg(target_os = "windows")]
const LIBRARY_NAME: &str = "Processing.NDI.Lib.x64.dll";
#[cfg(target_os = "macos")]
const LIBRARY_NAME: &str = "libndi.dylib";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const LIBRARY_NAME: &str = "libndi.so";

#[cfg(target_os = "windows")]
const SYSTEM_LIBRARIES: &[&str] = &[
    "Processing.NDI.Lib.x64.dll",
    "C:\\Program Files\\NDI\\NDI 6 Runtime\\v6\\Processing.NDI.Lib.x64.dll",
    "C:\\Program Files\\NDI\\NDI 5 Runtime\\v5\\Processing.NDI.Lib.x64.dll",
];
#[cfg(target_os = "macos")]
const SYSTEM_LIBRARIES: &[&str] = &[
    "/Library/NDI SDK for Apple/lib/macOS/libndi.dylib",
    "/Library/NDI SDK for macOS/lib/macOS/libndi.dylib",
    "/usr/local/lib/libndi.dylib",
    "/opt/homebrew/lib/libndi.dylib",
    "libndi.dylib",
];
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const SYSTEM_LIBRARIES: &[&str] = &[
    "libndi.so.6",
    "libndi.so.5",
    "libndi.so",
    "/usr/lib/libndi.so",
    "/usr/local/lib/libndi.so",
    "/usr/lib/x86_64-linux-gnu/libndi.so",
];

/// Where to look for the NDI runtime library, in search order.
pub fn runtime_library_candidates() -> Vec<PathBuf> {
    candidates_from(RUNTIME_DIR_VARS.iter().filter_map(|var| env::var_os(var).map(PathBuf::from)))
}

fn candidates_from(runtime_dirs: impl IntoIterator<Item = PathBuf>) -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = runtime_dirs
        .into_iter()
        .map(|dir| dir.join(LIBRARY_NAME))
        .collect();

    for library in SYSTEM_LIBRARIES {
        let path = PathBuf::from(library);
        if !candidates.contains(&path) {
            candidates.push(path);
        }
    }
    candidates
}
