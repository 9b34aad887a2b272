//! 8-bit end-around-carry complement checksum.
//!
//! The sum covers the payload bytes followed by the decimal string forms of
//! the sequence and acknowledgment numbers, folding the carry back into the
//! low 8 bits after every byte. An error-detecting code only; data and ack
//! packets use it identically.

use arq_lab_abstract::Packet;

/// Sentinel the checksum and complement sum of an intact packet add up to.
pub const CHECKSUM_SENTINEL: u16 = 0xFF;

/// Running one's-complement style sum over `payload`, then the decimal
/// digits of `seq`, then the decimal digits of `ack`.
pub fn complement_sum(payload: &str, seq: u32, ack: u32) -> u8 {
    let mut sum: u32 = 0;
    let digits = |n: u32| n.to_string().into_bytes();
    for byte in payload
        .bytes()
        .chain(digits(seq))
        .chain(digits(ack))
    {
        sum += byte as u32;
        // Fold the carry above the low 8 bits back in.
        sum = (sum & 0xFF) + (sum >> 8);
    }
    sum as u8
}

/// The value a sender embeds when building a packet over these fields.
pub fn checksum_for(payload: &str, seq: u32, ack: u32) -> u8 {
    (CHECKSUM_SENTINEL - complement_sum(payload, seq, ack) as u16) as u8
}

/// Validation predicate used by both endpoints on inbound packets.
pub fn is_valid(packet: &Packet) -> bool {
    let sum = complement_sum(&packet.payload, packet.seq_num, packet.ack_num);
    packet.checksum as u16 + sum as u16 == CHECKSUM_SENTINEL
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(payload: &str, seq: u32, ack: u32) -> Packet {
        Packet::new(seq, ack, checksum_for(payload, seq, ack), payload)
    }

    #[test]
    fn sum_of_empty_fields_covers_the_digit_bytes() {
        // "" + "0" + "0" is two ASCII '0' bytes.
        assert_eq!(complement_sum("", 0, 0), 96);
    }

    #[test]
    fn carry_folds_back_into_low_byte() {
        // 'z' * 3 = 366 -> fold to 110 + 1 = 111, then two '0' digits.
        assert_eq!(complement_sum("zzz", 0, 0), 207);
    }

    #[test]
    fn checksum_and_sum_meet_the_sentinel() {
        for (payload, seq, ack) in [("", 0, 0), ("hello", 3, 0), ("zzz", 12, 7)] {
            let c = checksum_for(payload, seq, ack) as u16;
            assert_eq!(c + complement_sum(payload, seq, ack) as u16, CHECKSUM_SENTINEL);
        }
    }

    #[test]
    fn built_packets_validate() {
        for payload in ["", "a", "ab", "abc", "zzz", "data-17"] {
            for seq in 0..10 {
                for ack in 0..10 {
                    let packet = build(payload, seq, ack);
                    assert!(is_valid(&packet), "payload={payload:?} seq={seq} ack={ack}");
                }
            }
        }
    }

    #[test]
    fn exhaustive_small_alphabet_rejects_field_tweaks() {
        let alphabet = ['a', 'b'];
        let mut payloads = vec![String::new()];
        let mut frontier = vec![String::new()];
        for _ in 0..3 {
            let mut next = Vec::new();
            for prefix in &frontier {
                for c in alphabet {
                    next.push(format!("{prefix}{c}"));
                }
            }
            payloads.extend(next.iter().cloned());
            frontier = next;
        }
        for payload in &payloads {
            for seq in 0..4 {
                for ack in 0..4 {
                    let good = build(payload, seq, ack);

                    // Bumping a numeric field changes one digit byte by one.
                    let mut bad_seq = good.clone();
                    bad_seq.seq_num += 1;
                    assert!(!is_valid(&bad_seq));

                    let mut bad_ack = good.clone();
                    bad_ack.ack_num += 1;
                    assert!(!is_valid(&bad_ack));
                }
            }
        }
    }

    #[test]
    fn flipped_payload_bit_is_detected() {
        let good = build("abc", 3, 0);
        for bit in 0..7 {
            let mut bytes = good.payload.clone().into_bytes();
            bytes[1] ^= 1 << bit;
            let mut bad = good.clone();
            bad.payload = String::from_utf8(bytes).unwrap();
            assert!(!is_valid(&bad), "bit {bit} flip went undetected");
        }
    }

    #[test]
    fn flipped_checksum_field_is_detected() {
        let mut packet = build("payload", 5, 0);
        packet.checksum = !packet.checksum;
        assert!(!is_valid(&packet));
    }
}
