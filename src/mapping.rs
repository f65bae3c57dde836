use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Loads a newline-delimited class-name file. The detector's class ids are
/// 0-based row indices into the returned list, so every line is kept (only
/// trimmed), even blank ones, to keep the indices aligned with the file.
pub fn load_class_names(file_path: impl AsRef<Path>) -> io::Result<Vec<String>> {
    let file = File::open(file_path)?;
    let reader = BufReader::new(file);

    reader
        .lines()
        .map(|line| line.map(|name| name.trim().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "obj-names-{}-{:?}",
            std::process::id(),
            std::thread::current().id()
        ));
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_names_in_file_order() {
        let path = write_temp("person\ncar\n  dog \n");
        let names = load_class_names(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(names, vec!["person", "car", "dog"]);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_class_names("/nonexistent/obj.names").is_err());
    }
}
