use std::str::FromStr;

use super::{
    error::{Error, FieldErrors},
    pagination::PageRequest,
};

pub type FormData = Vec<(String, String)>;

/// Query string parameters; keys may repeat (`?tags=a&tags=b`).
pub struct Form {
    inner: FormData,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        Self { inner: data }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<String> {
        self.inner
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.to_owned())
            .collect()
    }

    pub fn get_number<T>(&self, key: &str) -> Result<Option<T>, Error>
    where
        T: FromStr,
    {
        match self.get_str(key) {
            Some(value) => value
                .trim()
                .parse()
                .map(Some)
                .map_err(|_e| Error::validation(key, "A valid integer is required.")),
            None => Ok(None),
        }
    }

    pub fn get_flag(&self, key: &str) -> bool {
        matches!(
            self.get_str(key).map(|v| v.to_ascii_lowercase()).as_deref(),
            Some("1" | "true" | "yes")
        )
    }

    pub fn page_request(&self, default_limit: i64) -> Result<PageRequest, Error> {
        let mut errors = FieldErrors::default();

        let page = self.get_number::<i64>("page").unwrap_or_else(|_| {
            errors.add("page", "Invalid page.");
            None
        });
        let limit = self.get_number::<i64>("limit").unwrap_or_else(|_| {
            errors.add("limit", "A valid integer is required.");
            None
        });
        errors.into_result()?;

        Ok(PageRequest::new(
            page.unwrap_or(1),
            limit.unwrap_or(default_limit),
        ))
    }
}
