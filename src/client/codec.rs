use crate::core::errors::ApiError;
use crate::core::types::{ClientInfo, CommandResult, Message, Stats};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Every query method answers with `{"data": ...}`
#[derive(Deserialize)]
struct DataBody<T> {
    #[serde(default)]
    data: Option<T>,
}

fn decode_data<T: DeserializeOwned + Default>(body: &Value) -> Result<T, ApiError> {
    DataBody::<T>::deserialize(body)
        .map(|b| b.data.unwrap_or_default())
        .map_err(|e| ApiError::DeserializationError(format!("Failed to decode body: {}", e)))
}

/// Surface a non-empty `error` field as the command's error
pub fn check_result(result: &CommandResult) -> Result<&Value, ApiError> {
    match result.error_message() {
        Some(message) => Err(ApiError::CommandError(message.to_string())),
        None => Ok(&result.body),
    }
}

// The body of write commands carries nothing yet: no error means success.

pub fn decode_publish(_body: &Value) -> Result<bool, ApiError> {
    Ok(true)
}

pub fn decode_broadcast(_body: &Value) -> Result<bool, ApiError> {
    Ok(true)
}

pub fn decode_unsubscribe(_body: &Value) -> Result<bool, ApiError> {
    Ok(true)
}

pub fn decode_disconnect(_body: &Value) -> Result<bool, ApiError> {
    Ok(true)
}

/// Connected clients keyed by connection ID
pub fn decode_presence(body: &Value) -> Result<HashMap<String, ClientInfo>, ApiError> {
    decode_data(body)
}

pub fn decode_history(body: &Value) -> Result<Vec<Message>, ApiError> {
    decode_data(body)
}

/// Active channels, those with at least one subscriber
pub fn decode_channels(body: &Value) -> Result<Vec<String>, ApiError> {
    decode_data(body)
}

pub fn decode_stats(body: &Value) -> Result<Stats, ApiError> {
    decode_data(body)
}
