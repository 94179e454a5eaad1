use minicbor::{decode, to_vec};
use servo_protocol::ServoPosition;

/// CBOR record for a position. `None` only if encoding fails.
pub fn encode_position(position: &ServoPosition) -> Option<Vec<u8>> {
    to_vec(position).ok()
}

/// Decode a stored record, re-clamping in case the limits changed since it
/// was written.
pub fn decode_position(bytes: &[u8]) -> Option<ServoPosition> {
    let stored: ServoPosition = decode(bytes).ok()?;
    Some(ServoPosition::new(stored.upper(), stored.lower()))
}

#[cfg(target_os = "espidf")]
pub use nvs::PositionStore;

#[cfg(target_os = "espidf")]
mod nvs {
    use esp_idf_svc::nvs::{EspNvs, EspNvsPartition, NvsDefault};
    use esp_idf_sys::EspError;
    use log::{info, warn};
    use servo_protocol::ServoPosition;

    use super::{decode_position, encode_position};

    const NVS_NAMESPACE: &str = "servo_cfg";
    const KEY_POSITION: &str = "pos";

    /// Last committed servo position, kept in NVS across resets.
    pub struct PositionStore {
        nvs: EspNvs<NvsDefault>,
    }

    impl PositionStore {
        pub fn new(nvs_partition: EspNvsPartition<NvsDefault>) -> Result<Self, EspError> {
            let nvs = EspNvs::new(nvs_partition, NVS_NAMESPACE, true)?;
            Ok(Self { nvs })
        }

        /// Stored position, or `None` on first boot or if the record is unreadable.
        pub fn load(&self) -> Result<Option<ServoPosition>, EspError> {
            let mut buf = [0u8; 16];
            match self.nvs.get_raw(KEY_POSITION, &mut buf)? {
                Some(raw) => {
                    let position = decode_position(raw);
                    if position.is_none() {
                        warn!("Checkpoint record unreadable ({} bytes)", raw.len());
                    }
                    Ok(position)
                }
                None => Ok(None),
            }
        }

        pub fn save(&mut self, position: ServoPosition) -> Result<(), EspError> {
            let Some(bytes) = encode_position(&position) else {
                warn!("Checkpoint encode failed for {:?}", position);
                return Ok(());
            };
            self.nvs.set_raw(KEY_POSITION, &bytes)?;
            info!(
                "Checkpoint saved: upper={} lower={}",
                position.upper(),
                position.lower()
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minicbor::Encoder;

    #[test]
    fn test_checkpoint_roundtrip() {
        let pos = ServoPosition::new(140, 30);
        let bytes = encode_position(&pos).unwrap();
        assert!(bytes.len() <= 16);
        assert_eq!(decode_position(&bytes), Some(pos));
    }

    #[test]
    fn test_garbage_record_rejected() {
        assert_eq!(decode_position(&[]), None);
        assert_eq!(decode_position(&[0xff, 0x00, 0x13]), None);
    }

    #[test]
    fn test_out_of_range_record_reclamped() {
        // Hand-built record bypassing ServoPosition::new
        let mut buf = Vec::new();
        let mut enc = Encoder::new(&mut buf);
        enc.array(2).unwrap().u16(999).unwrap().u16(0).unwrap();

        let pos = decode_position(&buf).unwrap();
        assert_eq!(pos.upper(), 150);
        assert_eq!(pos.lower(), 26);
    }
}
