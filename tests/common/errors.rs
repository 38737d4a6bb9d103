use transactional_executor::{BusinessError, TransactionError};

pub const BAD_REQUEST: &str = "BAD_REQUEST";
pub const SERVER_DB_ERROR: &str = "SERVER_DB_ERROR";

pub fn bad_request(message: &str) -> BusinessError {
    BusinessError::new(400, BAD_REQUEST, message)
}

pub fn is_bad_request(err: &BusinessError) -> bool {
    err.is(400, BAD_REQUEST)
}

pub fn server_db_error(err: TransactionError) -> BusinessError {
    BusinessError::wrap(500, SERVER_DB_ERROR, err)
}

pub fn is_server_db_error(err: &BusinessError) -> bool {
    err.is(500, SERVER_DB_ERROR)
}
