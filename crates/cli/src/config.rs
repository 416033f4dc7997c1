use std::path::Path;

pub fn load_options(path: Option<&Path>) -> notetex_core::Result<notetex_core::Options> {
    match path {
        Some(path) => notetex_core::options::load_options_from_yaml_file(path),
        None => Ok(notetex_core::Options::default()),
    }
}
