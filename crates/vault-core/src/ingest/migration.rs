//! Decoder for authenticator migration exports
//!
//! Format: `otpauth-migration://offline?data=BASE64`, where the base64
//! wraps a protobuf `MigrationPayload`:
//!
//! ```text
//! MigrationPayload {
//!   repeated OtpParameters otp_parameters = 1;
//!   int32 version = 2; int32 batch_size = 3; int32 batch_index = 4; int32 batch_id = 5;
//! }
//! OtpParameters {
//!   bytes secret = 1; string name = 2; string issuer = 3;
//!   Algorithm algorithm = 4; DigitCount digits = 5; OtpType type = 6; int64 counter = 7;
//! }
//! ```
//!
//! Decoding is all-or-nothing: any malformed byte fails the whole payload.

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use url::Url;

use crate::error::{Result, VaultError};

/// Scheme of migration URLs
pub const MIGRATION_SCHEME: &str = "otpauth-migration";

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_decode_padding_mode(DecodePaddingMode::Indifferent)
    .with_decode_allow_trailing_bits(true);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// Hash algorithm of a migrated credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    #[default]
    Unspecified,
    Sha1,
    Sha256,
    Sha512,
    Md5,
}

impl From<u64> for Algorithm {
    fn from(value: u64) -> Self {
        match value {
            1 => Self::Sha1,
            2 => Self::Sha256,
            3 => Self::Sha512,
            4 => Self::Md5,
            _ => Self::Unspecified,
        }
    }
}

/// Code length of a migrated credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigitCount {
    #[default]
    Unspecified,
    Six,
    Eight,
}

impl From<u64> for DigitCount {
    fn from(value: u64) -> Self {
        match value {
            1 => Self::Six,
            2 => Self::Eight,
            _ => Self::Unspecified,
        }
    }
}

/// Counter- or time-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OtpType {
    #[default]
    Unspecified,
    Hotp,
    Totp,
}

impl From<u64> for OtpType {
    fn from(value: u64) -> Self {
        match value {
            1 => Self::Hotp,
            2 => Self::Totp,
            _ => Self::Unspecified,
        }
    }
}

/// One credential record of a migration payload
#[derive(Clone, PartialEq, Eq, Default)]
pub struct OtpParameters {
    pub secret: Vec<u8>,
    pub name: String,
    pub issuer: String,
    pub algorithm: Algorithm,
    pub digits: DigitCount,
    pub otp_type: OtpType,
    pub counter: u64,
}

impl OtpParameters {
    /// Secret as unpadded RFC 4648 base32
    pub fn secret_string(&self) -> String {
        base32::encode(base32::Alphabet::Rfc4648 { padding: false }, &self.secret)
    }

    /// Number of digits in generated codes (6 unless explicitly eight)
    pub fn digit_count(&self) -> u32 {
        match self.digits {
            DigitCount::Eight => 8,
            _ => 6,
        }
    }

    /// Code period in seconds; migration exports do not carry one
    pub fn period(&self) -> u32 {
        30
    }
}

impl std::fmt::Debug for OtpParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpParameters")
            .field("secret", &"[REDACTED]")
            .field("name", &self.name)
            .field("issuer", &self.issuer)
            .field("algorithm", &self.algorithm)
            .field("digits", &self.digits)
            .field("otp_type", &self.otp_type)
            .field("counter", &self.counter)
            .finish()
    }
}

/// Decoded migration export
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Payload {
    pub otp_parameters: Vec<OtpParameters>,
    pub version: i32,
    pub batch_size: i32,
    pub batch_index: i32,
    pub batch_id: i32,
}

/// Decode a full `otpauth-migration://...` URL
pub fn decode_url(input: &str) -> Result<Payload> {
    let url = Url::parse(input).map_err(|e| VaultError::MigrationDecodeError(e.to_string()))?;

    if url.scheme() != MIGRATION_SCHEME {
        return Err(VaultError::MigrationDecodeError(format!(
            "expected scheme '{}', got '{}'",
            MIGRATION_SCHEME,
            url.scheme()
        )));
    }

    let data = url
        .query_pairs()
        .find(|(key, _)| key == "data")
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| VaultError::MigrationDecodeError("missing 'data' parameter".to_string()))?;

    decode_data(&data)
}

/// Decode the base64 text of the `data` parameter
///
/// Spaces are read back as `+` (form decoding turns an unescaped `+`
/// into a space). Standard and URL-safe alphabets are both accepted,
/// padded or not.
pub fn decode_data(data: &str) -> Result<Payload> {
    let data = data.trim().replace(' ', "+");

    let engine = if data.contains(['-', '_']) {
        &URL_SAFE_LENIENT
    } else {
        &STANDARD_LENIENT
    };
    let bytes = engine
        .decode(data.as_bytes())
        .map_err(|e| VaultError::MigrationDecodeError(format!("invalid base64: {}", e)))?;

    decode_payload(&bytes)
}

/// Decode the protobuf bytes of a migration payload
pub fn decode_payload(bytes: &[u8]) -> Result<Payload> {
    let mut payload = Payload::default();
    let mut reader = WireReader::new(bytes);

    while let Some((field, wire_type)) = reader.read_key()? {
        match (field, wire_type) {
            (1, WIRE_LEN) => {
                let record = reader.read_bytes()?;
                payload.otp_parameters.push(decode_otp_parameters(record)?);
            }
            (2, WIRE_VARINT) => payload.version = reader.read_varint()? as i32,
            (3, WIRE_VARINT) => payload.batch_size = reader.read_varint()? as i32,
            (4, WIRE_VARINT) => payload.batch_index = reader.read_varint()? as i32,
            (5, WIRE_VARINT) => payload.batch_id = reader.read_varint()? as i32,
            (_, other) => reader.skip(other)?,
        }
    }

    Ok(payload)
}

fn decode_otp_parameters(bytes: &[u8]) -> Result<OtpParameters> {
    let mut params = OtpParameters::default();
    let mut reader = WireReader::new(bytes);

    while let Some((field, wire_type)) = reader.read_key()? {
        match (field, wire_type) {
            (1, WIRE_LEN) => params.secret = reader.read_bytes()?.to_vec(),
            (2, WIRE_LEN) => params.name = reader.read_string()?,
            (3, WIRE_LEN) => params.issuer = reader.read_string()?,
            (4, WIRE_VARINT) => params.algorithm = reader.read_varint()?.into(),
            (5, WIRE_VARINT) => params.digits = reader.read_varint()?.into(),
            (6, WIRE_VARINT) => params.otp_type = reader.read_varint()?.into(),
            (7, WIRE_VARINT) => params.counter = reader.read_varint()?,
            (_, other) => reader.skip(other)?,
        }
    }

    Ok(params)
}

const WIRE_VARINT: u8 = 0;
const WIRE_FIXED64: u8 = 1;
const WIRE_LEN: u8 = 2;
const WIRE_FIXED32: u8 = 5;

/// Minimal protobuf wire-format reader
struct WireReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Next field number and wire type, or `None` at end of input
    fn read_key(&mut self) -> Result<Option<(u64, u8)>> {
        if self.pos >= self.data.len() {
            return Ok(None);
        }
        let key = self.read_varint()?;
        let field = key >> 3;
        if field == 0 {
            return Err(truncated("field number 0"));
        }
        Ok(Some((field, (key & 0x07) as u8)))
    }

    fn read_varint(&mut self) -> Result<u64> {
        let mut value = 0u64;
        for shift in (0..64).step_by(7) {
            let byte = *self
                .data
                .get(self.pos)
                .ok_or_else(|| truncated("varint runs past end of input"))?;
            self.pos += 1;
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(truncated("varint longer than 10 bytes"))
    }

    fn read_bytes(&mut self) -> Result<&'a [u8]> {
        let len = usize::try_from(self.read_varint()?)
            .map_err(|_| truncated("length does not fit in memory"))?;
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| truncated("length-delimited field runs past end of input"))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| VaultError::MigrationDecodeError("string field is not UTF-8".to_string()))
    }

    fn skip(&mut self, wire_type: u8) -> Result<()> {
        let width = match wire_type {
            WIRE_VARINT => return self.read_varint().map(|_| ()),
            WIRE_LEN => return self.read_bytes().map(|_| ()),
            WIRE_FIXED64 => 8,
            WIRE_FIXED32 => 4,
            other => {
                return Err(VaultError::MigrationDecodeError(format!(
                    "unsupported wire type {}",
                    other
                )))
            }
        };
        if self.data.len() - self.pos < width {
            return Err(truncated("fixed-width field runs past end of input"));
        }
        self.pos += width;
        Ok(())
    }
}

fn truncated(detail: &str) -> VaultError {
    VaultError::MigrationDecodeError(format!("malformed payload: {}", detail))
}
