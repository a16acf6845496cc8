//! Built-in redactors: exemplar in-place byte transforms for phone and
//! national ID numbers.
//!
//! Each walks its window left to right looking for one token of the shape it
//! recognises, overwrites the middle of the first hit with `*`, and returns.
//! Classification goes through small byte tables, the same trick the
//! scanner's own tables use. Both tolerate the URL-escape prefixes (`%22`,
//! `%3A`) and the `+86` country prefix that show up in encoded payloads.

/// Byte classes for the phone grammar: 1 digit, 2 `+`, 3 `%`.
const PHONE_CLASS: [u8; 256] = {
    let mut table = [0u8; 256];
    let mut d = 0;
    while d < 10 {
        table[b'0' as usize + d] = 1;
        d += 1;
    }
    table[b'+' as usize] = 2;
    table[b'%' as usize] = 3;
    table
};

/// Byte classes for the ID grammar: 1 digit, 2 `x`/`X`, 3 `%`.
const ID_CLASS: [u8; 256] = {
    let mut table = [0u8; 256];
    let mut d = 0;
    while d < 10 {
        table[b'0' as usize + d] = 1;
        d += 1;
    }
    table[b'x' as usize] = 2;
    table[b'X' as usize] = 2;
    table[b'%' as usize] = 3;
    table
};

/// Masks the first 11-digit phone number in `buf`, overwriting digits 4
/// through 7 of the run with `****`.
///
/// `+` is skipped with the next two bytes (consuming `+86`), `%` likewise
/// (consuming `%22` or `%3A`). At most one redaction per call.
pub fn phone_redactor(buf: &mut [u8]) {
    let n = buf.len();
    let mut i = 0;
    while i < n {
        if n - i < 11 {
            return;
        }
        match PHONE_CLASS[buf[i] as usize] {
            0 => {
                i += 1;
                continue;
            }
            2 | 3 => {
                i += 3;
                continue;
            }
            _ => {}
        }

        let run = i;
        let mut j = run + 1;
        let mut digits = true;
        while j < run + 11 {
            if PHONE_CLASS[buf[j] as usize] != 1 {
                digits = false;
                break;
            }
            j += 1;
        }
        if !digits {
            i = j + 1;
            continue;
        }

        buf[run + 3..run + 7].fill(b'*');
        return;
    }
}

/// Masks the first 15- or 18-character ID number in `buf`.
///
/// A run of 14 digits followed by a digit or `x`/`X` is a 15-character ID:
/// characters 7 through 11 become `*****`. When the run extends to 18
/// characters (the last may be `x`/`X`), characters 7 through 14 become
/// `********` instead; runs of 16 or 17 digits still get the short mask.
/// `%` is skipped with its two escape bytes. At most one redaction per call.
pub fn id_redactor(buf: &mut [u8]) {
    let n = buf.len();
    let mut i = 0;
    while i < n {
        if n - i < 15 {
            return;
        }
        match ID_CLASS[buf[i] as usize] {
            0 | 2 => {
                i += 1;
                continue;
            }
            3 => {
                i += 3;
                continue;
            }
            _ => {}
        }

        let run = i;
        let mut j = run + 1;
        let mut digits = true;
        while j < run + 14 {
            if ID_CLASS[buf[j] as usize] != 1 {
                digits = false;
                break;
            }
            j += 1;
        }
        if !digits {
            i = j + 1;
            continue;
        }

        // Character 15 closes the short form when it is x/X.
        match ID_CLASS[buf[j] as usize] {
            2 => {
                buf[run + 6..run + 11].fill(b'*');
                return;
            }
            1 => {}
            _ => {
                i = j + 1;
                continue;
            }
        }

        // Characters 16 and 17: any non-digit, or running out of buffer,
        // still closes the short form.
        for _ in 0..2 {
            j += 1;
            if j >= n || ID_CLASS[buf[j] as usize] != 1 {
                buf[run + 6..run + 11].fill(b'*');
                return;
            }
        }

        // Character 18: a digit or x/X closes the long form.
        j += 1;
        if j < n && matches!(ID_CLASS[buf[j] as usize], 1 | 2) {
            buf[run + 6..run + 14].fill(b'*');
        } else {
            buf[run + 6..run + 11].fill(b'*');
        }
        return;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::bytes::Regex;

    // Regex references mirroring each grammar, used to cross-check the
    // hand-rolled walkers case by case.

    fn phone_oracle(buf: &[u8]) -> Vec<u8> {
        let re = Regex::new(r"((%22|%3a|%3A)?)((\+?86)?)(\d{3})(\d{4})(\d{4})").unwrap();
        if re.is_match(buf) {
            re.replace_all(buf, &b"$1$3$5****$7"[..]).into_owned()
        } else {
            buf.to_vec()
        }
    }

    fn id_oracle(buf: &[u8]) -> Vec<u8> {
        let id18 = Regex::new(r"((%22|%3a|%3A)?)(\d{6})(\d{8})(\d{3}(x|X|\d))").unwrap();
        let id15 = Regex::new(r"((%22|%3a|%3A)?)(\d{6})(\d{5})(\d{3}(x|X|\d))").unwrap();
        if id18.is_match(buf) {
            return id18.replace_all(buf, &b"$1$3********$5"[..]).into_owned();
        }
        if id15.is_match(buf) {
            return id15.replace_all(buf, &b"$1$3*****$5"[..]).into_owned();
        }
        buf.to_vec()
    }

    const PHONE_CASES: &[(&str, &str)] = &[
        ("123", "123"),
        ("abc12345678", "abc12345678"),
        ("12345f78901", "12345f78901"),
        ("12345678901", "123****8901"),
        ("12345678901a", "123****8901a"),
        ("123456789011", "123****89011"),
        ("+8234567890", "+8234567890"),
        ("+8612345f78901", "+8612345f78901"),
        ("+8612345678901", "+86123****8901"),
        ("+8612345678901a", "+86123****8901a"),
        ("+86123456789011", "+86123****89011"),
        ("%1234567890", "%1234567890"),
        ("%2212345f78901", "%2212345f78901"),
        ("%3A12345678901", "%3A123****8901"),
        ("%2212345678901a", "%22123****8901a"),
    ];

    #[test]
    fn phone_cases() {
        for (src, want) in PHONE_CASES {
            let mut buf = src.as_bytes().to_vec();
            phone_redactor(&mut buf);
            assert_eq!(&buf, want.as_bytes(), "phone_redactor on {src:?}");
            assert_eq!(
                phone_oracle(src.as_bytes()),
                want.as_bytes(),
                "phone oracle on {src:?}"
            );
        }
    }

    const ID_CASES: &[(&str, &str)] = &[
        ("123", "123"),
        ("abcdef123456789", "abcdef123456789"),
        ("1234567t9012345", "1234567t9012345"),
        ("12345678901234a", "12345678901234a"),
        ("12345678901234x", "123456*****234x"),
        ("12345678901234X", "123456*****234X"),
        ("123456789012345", "123456*****2345"),
        ("123456789012345a", "123456*****2345a"),
        ("1234567890123450", "123456*****23450"),
        ("1234567890123450b", "123456*****23450b"),
        ("12345678901234503", "123456*****234503"),
        ("12345678901234567c", "123456*****234567c"),
        ("123456789012345678", "123456********5678"),
        ("12345678901234567x", "123456********567x"),
        ("12345678901234567X", "123456********567X"),
        ("%12345678901234", "%12345678901234"),
        ("%22123456789045678", "%22123456*****5678"),
        ("%22123456789012345678", "%22123456********5678"),
    ];

    #[test]
    fn id_cases() {
        for (src, want) in ID_CASES {
            let mut buf = src.as_bytes().to_vec();
            id_redactor(&mut buf);
            assert_eq!(&buf, want.as_bytes(), "id_redactor on {src:?}");
            assert_eq!(
                id_oracle(src.as_bytes()),
                want.as_bytes(),
                "id oracle on {src:?}"
            );
        }
    }

    #[test]
    fn masks_only_the_first_hit() {
        let mut buf = b"12345678901 22345678901".to_vec();
        phone_redactor(&mut buf);
        assert_eq!(&buf, b"123****8901 22345678901");
    }

    #[test]
    fn short_windows_are_left_alone() {
        let mut buf = b"1234567890".to_vec();
        phone_redactor(&mut buf);
        assert_eq!(&buf, b"1234567890");

        let mut buf = b"12345678901234".to_vec();
        id_redactor(&mut buf);
        assert_eq!(&buf, b"12345678901234");
    }
}
