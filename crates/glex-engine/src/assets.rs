//! Shader source loading.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::render::ShaderSources;

/// Reads a UTF-8 shader source file.
pub fn read_shader(path: &Path) -> Result<String> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read shader {}", path.display()))?;
    anyhow::ensure!(!text.trim().is_empty(), "shader {} is empty", path.display());
    Ok(text)
}

/// Reads a vertex/fragment pair.
pub fn read_shader_sources(vertex: &Path, fragment: &Path) -> Result<ShaderSources> {
    Ok(ShaderSources::new(read_shader(vertex)?, read_shader(fragment)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, body: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("glex-{}-{name}", std::process::id()));
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn reads_pair() {
        let v = temp_file("pair.vert", "void main() {}");
        let f = temp_file("pair.frag", "void main() { }");
        let s = read_shader_sources(&v, &f).unwrap();
        assert_eq!(s.vertex, "void main() {}");
        assert_eq!(s.fragment, "void main() { }");
    }

    #[test]
    fn missing_file_names_path() {
        let err = read_shader(Path::new("/nonexistent/glex/shader.frag")).unwrap_err();
        assert!(format!("{err:#}").contains("shader.frag"));
    }

    #[test]
    fn empty_file_is_rejected() {
        let p = temp_file("empty.frag", "  \n");
        assert!(read_shader(&p).is_err());
    }
}
