//! Analyzer command-line construction.

use std::path::Path;

use luau_watch_types::Settings;

/// Selects the `file:line.col-line.col: Category: message` report format.
pub const FORMATTER_FLAG: &str = "--formatter=gnu";
pub const IGNORE_FLAG: &str = "--ignore";
pub const PROJECT_FLAG: &str = "--project";
pub const DEFS_FLAG: &str = "--defs";

/// Introspection flags. Only ever passed by on-demand commands.
pub const DUMP_SOURCE_MAP_FLAG: &str = "--dump-source-map";
pub const ANNOTATE_FLAG: &str = "--annotate";

/// Build the argument list for diagnostic runs, without the file path.
///
/// Rojo flags are emitted only when Rojo mode is on, and each only when its
/// path is known. Output is a pure function of the inputs.
pub(crate) fn build_arguments(
    settings: &Settings,
    project: Option<&Path>,
    type_defs: Option<&Path>,
) -> Vec<String> {
    let mut args = vec![FORMATTER_FLAG.to_string()];

    args.extend(
        settings
            .ignored_paths()
            .iter()
            .map(|pattern| format!("{IGNORE_FLAG}={pattern}")),
    );

    if settings.uses_rojo() {
        if let Some(project) = project {
            args.push(format!("{PROJECT_FLAG}={}", project.display()));
        }
        if let Some(defs) = type_defs {
            args.push(format!("{DEFS_FLAG}={}", defs.display()));
        }
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use luau_watch_types::RawSettings;

    fn settings(uses_rojo: bool, ignored: &[&str]) -> Settings {
        Settings::resolve(RawSettings {
            uses_rojo,
            ignored_paths: ignored.iter().map(ToString::to_string).collect(),
            ..RawSettings::default()
        })
        .settings
    }

    #[test]
    fn test_plain_mode_only_formatter() {
        let args = build_arguments(&settings(false, &[]), None, None);
        assert_eq!(args, vec!["--formatter=gnu"]);
    }

    #[test]
    fn test_ignored_paths_in_order() {
        let args = build_arguments(&settings(false, &["Packages/*", "_Index"]), None, None);
        assert_eq!(
            args,
            vec!["--formatter=gnu", "--ignore=Packages/*", "--ignore=_Index"]
        );
    }

    #[test]
    fn test_rojo_paths_omitted_when_mode_disabled() {
        let args = build_arguments(
            &settings(false, &[]),
            Some(Path::new("/w/default.project.json")),
            Some(Path::new("/w/globalTypes.d.lua")),
        );
        assert_eq!(args, vec!["--formatter=gnu"]);
    }

    #[test]
    fn test_rojo_paths_included_when_enabled() {
        let args = build_arguments(
            &settings(true, &["x"]),
            Some(Path::new("/w/default.project.json")),
            Some(Path::new("/w/globalTypes.d.lua")),
        );
        assert_eq!(
            args,
            vec![
                "--formatter=gnu",
                "--ignore=x",
                "--project=/w/default.project.json",
                "--defs=/w/globalTypes.d.lua",
            ]
        );
    }

    #[test]
    fn test_rojo_missing_path_omits_only_that_flag() {
        let args = build_arguments(&settings(true, &[]), None, Some(Path::new("/w/t.d.lua")));
        assert_eq!(args, vec!["--formatter=gnu", "--defs=/w/t.d.lua"]);
    }

    #[test]
    fn test_idempotent() {
        let s = settings(true, &["a", "b"]);
        let p = Some(Path::new("/w/p.project.json"));
        assert_eq!(build_arguments(&s, p, None), build_arguments(&s, p, None));
    }
}
