use rand::Rng;
use time::OffsetDateTime;

const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const SUFFIX_LEN: usize = 8;

/// `PS-<year>-<8 chars>`; the suffix avoids look-alike characters.
pub(crate) fn generate_certificate_number() -> String {
    format_number(OffsetDateTime::now_utc().year(), &generate_suffix(SUFFIX_LEN))
}

fn format_number(year: i32, suffix: &str) -> String {
    format!("PS-{year}-{suffix}")
}

fn generate_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char).collect()
}

/// Cheap shape check so malformed lookups skip the database.
pub(crate) fn looks_like_certificate_number(value: &str) -> bool {
    let mut parts = value.split('-');
    let (Some(prefix), Some(year), Some(suffix), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    prefix == "PS"
        && year.len() == 4
        && year.bytes().all(|byte| byte.is_ascii_digit())
        && suffix.len() == SUFFIX_LEN
        && suffix.bytes().all(|byte| byte.is_ascii_uppercase() || byte.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_numbers_have_expected_shape() {
        let number = generate_certificate_number();
        assert!(looks_like_certificate_number(&number), "{number}");
        let suffix = number.rsplit('-').next().unwrap();
        assert!(suffix.bytes().all(|byte| ALPHABET.contains(&byte)));
    }

    #[test]
    fn numbers_are_not_repeated() {
        let numbers: std::collections::HashSet<String> =
            (0..500).map(|_| generate_certificate_number()).collect();
        assert_eq!(numbers.len(), 500);
    }

    #[test]
    fn shape_check_rejects_garbage() {
        assert_eq!(format_number(2026, "ABCD2345"), "PS-2026-ABCD2345");
        assert!(looks_like_certificate_number("PS-2026-ABCD2345"));
        assert!(!looks_like_certificate_number("BOGUS-000"));
        assert!(!looks_like_certificate_number("PS-26-ABCD2345"));
        assert!(!looks_like_certificate_number("PS-2026-abcd2345"));
        assert!(!looks_like_certificate_number("PS-2026-ABCD2345-X"));
    }
}
