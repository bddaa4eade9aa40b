use std::path::{Path, PathBuf};

const WORKSPACE_VARIABLES: [&str; 2] = ["${workspaceFolder}", "${workspaceRoot}"];

/// Expands `${workspaceFolder}` and `${workspaceRoot}` in a path template.
///
/// ```
/// use yaml2mcp::config::resolve_path_template;
/// use std::path::{Path, PathBuf};
///
/// let path = resolve_path_template("${workspaceFolder}/mcp.yaml", Path::new("/work"));
/// assert_eq!(path, PathBuf::from("/work/mcp.yaml"));
/// ```
pub fn resolve_path_template(template: &str, workspace_folder: &Path) -> PathBuf {
    let folder = workspace_folder.to_string_lossy();
    let resolved = WORKSPACE_VARIABLES
        .iter()
        .fold(template.to_string(), |acc, variable| {
            acc.replace(variable, &folder)
        });
    PathBuf::from(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_variables_expand() {
        let folder = Path::new("/home/me/project");
        assert_eq!(
            resolve_path_template("${workspaceRoot}/.vscode/mcp.json", folder),
            PathBuf::from("/home/me/project/.vscode/mcp.json")
        );
        assert_eq!(
            resolve_path_template("${workspaceFolder}/a/${workspaceFolder}", folder),
            PathBuf::from("/home/me/project/a//home/me/project")
        );
    }

    #[test]
    fn test_plain_path_is_untouched() {
        assert_eq!(
            resolve_path_template("/etc/mcp.yaml", Path::new("/work")),
            PathBuf::from("/etc/mcp.yaml")
        );
    }
}
