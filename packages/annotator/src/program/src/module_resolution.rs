// Module Resolution
//
// Maps an import specifier to a file of the program. Relative specifiers resolve against
// the importing file's directory. Bare specifiers resolve against the program root, where
// typings for packages are expected under their package name.

const EXTENSIONS: [&str; 4] = ["", ".ts", ".tsx", ".d.ts"];
const INDEX_FILES: [&str; 2] = ["/index.ts", "/index.d.ts"];

/// File names to try, in order, for `specifier` imported from `importing_file`.
pub fn module_candidates(importing_file: &str, specifier: &str) -> Vec<String> {
    let base = if specifier.starts_with("./") || specifier.starts_with("../") {
        match importing_file.rfind('/') {
            Some(slash) => normalize_path(&format!("{}/{}", &importing_file[..slash], specifier)),
            None => normalize_path(specifier),
        }
    } else {
        normalize_path(specifier)
    };
    // `./foo.js` names the output of `./foo.ts`.
    let base = base.strip_suffix(".js").map(str::to_string).unwrap_or(base);

    EXTENSIONS
        .iter()
        .map(|extension| format!("{}{}", base, extension))
        .chain(INDEX_FILES.iter().map(|index| format!("{}{}", base, index)))
        .collect()
}

/// Collapses `.` and `..` segments. A leading `/` is kept; leading `..` segments that climb
/// above the root are dropped.
pub fn normalize_path(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }
    let joined = segments.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}
