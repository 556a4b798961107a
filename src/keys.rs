use std::path::{Component, Path};

use chrono::NaiveDate;

use crate::{
    error::{Error, Result},
    format::format_date,
};

pub const KEY_SEPARATOR: char = '/';

/// `<YYYY-MM-DD>/<relative path>`, with path components joined by `/`
/// whatever the platform separator is.
pub fn object(date: NaiveDate, relative_path: &Path) -> Result<String> {
    let mut key = format_date(date);
    for component in relative_path.components() {
        if let Component::Normal(name) = component {
            let name = name
                .to_str()
                .ok_or_else(|| Error::InvalidKey(relative_path.to_owned()))?;
            key.push(KEY_SEPARATOR);
            key.push_str(name);
        }
    }

    Ok(key)
}
