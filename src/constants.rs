pub const RECIPE_COUNT_PER_PAGE: i64 = 6;
pub const USER_COUNT_PER_PAGE: i64 = 6;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const MAX_PAGE: i64 = i32::MAX as i64;

pub const MAX_LEN_EMAIL: usize = 254;
pub const MAX_LEN_NAME: usize = 150;
pub const MAX_LEN_TITLE: usize = 200;
pub const MAX_LEN_RECIPE_NAME: usize = 150;
pub const MAX_LEN_PASSWORD: usize = 128;

pub const MIN_COOKING_TIME: i64 = 1;
pub const MAX_COOKING_TIME: i64 = 32767;
pub const MIN_AMOUNT: i64 = 1;
pub const MAX_AMOUNT: i64 = 32767;

pub const CACHE_TTL_SECONDS: u64 = 60 * 60;

pub const SHOPPING_LIST_FILENAME: &str = "shopping_cart.txt";

pub const AUTH_HEADER_SCHEMES: &[&str] = &["Token", "Bearer"];
