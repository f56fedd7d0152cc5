//! FFI Layer for Plutus Core
//!
//! All C-ABI exports are defined here. Every function follows one pattern:
//! - Input: JSON string (null-terminated C string)
//! - Output: JSON string (must be freed with `plutus_free_string`)
//!
//! Error handling: every response carries a `success` field. On error,
//! `success: false` and the `error` object is populated.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use serde::{Deserialize, Serialize};

use crate::error::{PlutusError, PlutusResult};
use crate::portfolio;
use crate::types::{Account, ApiResponse, Chain, TokenHolding};
use crate::wallet::{self, RecoveryPhrase};

// =============================================================================
// Memory Management
// =============================================================================

/// Free a string returned by any plutus_* function
///
/// # Safety
/// The pointer must have been returned by a plutus_* function and not freed
/// before.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn plutus_free_string(s: *mut c_char) {
    if s.is_null() {
        return;
    }
    drop(unsafe { CString::from_raw(s) });
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Read a C string into an owned Rust string, or an error response
fn parse_input(input: *const c_char) -> Result<String, *mut c_char> {
    if input.is_null() {
        return Err(error_response(PlutusError::decode("Null input pointer")));
    }

    let c_str = unsafe { CStr::from_ptr(input) };
    c_str
        .to_str()
        .map(str::to_owned)
        .map_err(|_| error_response(PlutusError::decode("Invalid UTF-8 string")))
}

fn parse_request<T: for<'de> Deserialize<'de>>(input: *const c_char) -> Result<T, *mut c_char> {
    let json_str = parse_input(input)?;
    serde_json::from_str(&json_str)
        .map_err(|e| error_response(PlutusError::decode(format!("Invalid JSON: {}", e))))
}

fn success_response<T: Serialize>(data: T) -> *mut c_char {
    string_to_ptr(ApiResponse::ok(data).to_json())
}

fn error_response(error: PlutusError) -> *mut c_char {
    let response: ApiResponse<()> = ApiResponse::err(error);
    string_to_ptr(response.to_json())
}

fn string_to_ptr(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(c_str) => c_str.into_raw(),
        Err(_) => c"{\"success\":false,\"error\":{\"code\":\"internal\",\"message\":\"String conversion failed\"}}"
            .to_owned()
            .into_raw(),
    }
}

// =============================================================================
// Recovery Phrase
// =============================================================================

#[derive(Serialize)]
struct PhraseResponse {
    words: Vec<String>,
}

/// Generate a fresh 12-word recovery phrase
///
/// # Output
/// ```json
/// { "success": true, "data": { "words": ["word1", "word2", ...] } }
/// ```
#[unsafe(no_mangle)]
pub extern "C" fn plutus_generate_phrase() -> *mut c_char {
    match wallet::generate_phrase() {
        Ok(phrase) => success_response(PhraseResponse {
            words: phrase.words().to_vec(),
        }),
        Err(e) => error_response(e),
    }
}

/// Check a phrase against word count, wordlist and checksum
///
/// # Input
/// ```json
/// { "words": ["word1", ...] }
/// ```
/// or `{ "phrase": "word1 word2 ..." }`
///
/// # Output
/// ```json
/// { "success": true, "data": { "valid": true } }
/// ```
#[unsafe(no_mangle)]
pub extern "C" fn plutus_validate_phrase(input: *const c_char) -> *mut c_char {
    #[derive(Deserialize)]
    struct ValidateRequest {
        #[serde(default)]
        words: Option<Vec<String>>,
        #[serde(default)]
        phrase: Option<String>,
    }

    #[derive(Serialize)]
    struct ValidateResponse {
        valid: bool,
    }

    let request: ValidateRequest = match parse_request(input) {
        Ok(r) => r,
        Err(ptr) => return ptr,
    };

    let valid = match (request.words, request.phrase) {
        (Some(words), _) => RecoveryPhrase::from_words(&words).is_ok(),
        (None, Some(phrase)) => wallet::validate_phrase(&phrase),
        (None, None) => false,
    };
    success_response(ValidateResponse { valid })
}

// =============================================================================
// Derivation
// =============================================================================

/// Derive the account at `index` for `chain`
///
/// # Input
/// ```json
/// { "phrase": "word1 word2 ...", "chain": "solana", "index": 0 }
/// ```
///
/// # Output
/// ```json
/// {
///   "success": true,
///   "data": { "publicKey": "...", "privateKey": "...", "path": "m/44'/501'/0'/0'", "chain": "solana" }
/// }
/// ```
#[unsafe(no_mangle)]
pub extern "C" fn plutus_derive_account(input: *const c_char) -> *mut c_char {
    #[derive(Deserialize)]
    struct DeriveRequest {
        phrase: String,
        chain: String,
        #[serde(default)]
        index: u32,
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct DeriveResponse {
        public_key: String,
        private_key: String,
        path: String,
        chain: Chain,
    }

    let request: DeriveRequest = match parse_request(input) {
        Ok(r) => r,
        Err(ptr) => return ptr,
    };

    let result = (|| -> PlutusResult<Account> {
        let phrase = RecoveryPhrase::parse(&request.phrase)?;
        let chain: Chain = request.chain.parse()?;
        wallet::derive_account(&phrase, chain, request.index)
    })();

    match result {
        Ok(account) => success_response(DeriveResponse {
            public_key: account.public_key.clone(),
            private_key: account.private_key.clone(),
            path: account.path.to_string(),
            chain: account.chain,
        }),
        Err(e) => error_response(e),
    }
}

/// Validate and normalize an address for `chain`
///
/// # Input
/// ```json
/// { "address": "0x...", "chain": "ethereum" }
/// ```
#[unsafe(no_mangle)]
pub extern "C" fn plutus_validate_address(input: *const c_char) -> *mut c_char {
    #[derive(Deserialize)]
    struct AddressRequest {
        address: String,
        chain: String,
    }

    #[derive(Serialize)]
    struct AddressResponse {
        valid: bool,
        normalized: Option<String>,
    }

    let request: AddressRequest = match parse_request(input) {
        Ok(r) => r,
        Err(ptr) => return ptr,
    };

    let chain: Chain = match request.chain.parse() {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };

    let (valid, normalized) = wallet::validate_address(&request.address, chain);
    success_response(AddressResponse { valid, normalized })
}

// =============================================================================
// Portfolio
// =============================================================================

/// Filter holdings by a case-sensitive substring of name, symbol or mint
///
/// # Input
/// ```json
/// { "holdings": [ ... ], "query": "USD" }
/// ```
///
/// # Output
/// The matching holdings, in their original order.
#[unsafe(no_mangle)]
pub extern "C" fn plutus_search_holdings(input: *const c_char) -> *mut c_char {
    #[derive(Deserialize)]
    struct SearchRequest {
        holdings: Vec<TokenHolding>,
        #[serde(default)]
        query: String,
    }

    let request: SearchRequest = match parse_request(input) {
        Ok(r) => r,
        Err(ptr) => return ptr,
    };

    let matches: Vec<&TokenHolding> = portfolio::search(&request.holdings, &request.query);
    success_response(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn call(f: extern "C" fn(*const c_char) -> *mut c_char, input: &str) -> Value {
        let input = CString::new(input).unwrap();
        let ptr = f(input.as_ptr());
        let out = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_owned();
        unsafe { plutus_free_string(ptr) };
        serde_json::from_str(&out).unwrap()
    }

    #[test]
    fn test_generate_phrase() {
        let ptr = plutus_generate_phrase();
        let out = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_owned();
        unsafe { plutus_free_string(ptr) };

        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["success"], true);
        let words: Vec<String> = serde_json::from_value(value["data"]["words"].clone()).unwrap();
        assert_eq!(words.len(), 12);
        assert!(RecoveryPhrase::from_words(&words).is_ok());
    }

    #[test]
    fn test_validate_phrase() {
        let value = call(plutus_validate_phrase, &format!(r#"{{"phrase":"{}"}}"#, PHRASE));
        assert_eq!(value["data"]["valid"], true);

        let value = call(plutus_validate_phrase, r#"{"words":["abandon","abandon"]}"#);
        assert_eq!(value["data"]["valid"], false);

        let value = call(plutus_validate_phrase, "not json");
        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["code"], "decode_error");
    }

    #[test]
    fn test_derive_account() {
        let value = call(
            plutus_derive_account,
            &format!(r#"{{"phrase":"{}","chain":"ethereum","index":0}}"#, PHRASE),
        );
        assert_eq!(value["success"], true);
        assert_eq!(value["data"]["publicKey"], "0x2759A6Ad812b8A7B73A63a243816D66F5b72A0A7");
        assert_eq!(value["data"]["path"], "m/44'/60'/0'/0'");

        let value = call(
            plutus_derive_account,
            &format!(r#"{{"phrase":"{}","chain":"bitcoin"}}"#, PHRASE),
        );
        assert_eq!(value["error"]["code"], "unsupported_chain");
    }

    #[test]
    fn test_search_holdings() {
        let input = r#"{
            "holdings": [
                {"mint":"So1","name":"Solana","symbol":"SOL","decimals":9,"amount":"1.5","iconUrl":null,"isNative":true},
                {"mint":"Mint2","name":"USD Coin","symbol":"USDC","decimals":6,"amount":"10","iconUrl":null}
            ],
            "query": "USD"
        }"#;
        let value = call(plutus_search_holdings, input);
        assert_eq!(value["success"], true);
        assert_eq!(value["data"].as_array().unwrap().len(), 1);
        assert_eq!(value["data"][0]["symbol"], "USDC");
    }

    #[test]
    fn test_null_input() {
        let ptr = plutus_validate_phrase(std::ptr::null());
        let out = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_owned();
        unsafe { plutus_free_string(ptr) };
        assert!(out.contains("Null input pointer"));
    }
}
