//! Stable hashes shared with the metrics backend.
//!
//! Both hashes fold with `h = h * 31 + x` in 32-bit two's-complement
//! arithmetic, so overflow wraps and results may be negative. The backend
//! recomputes program identities from the same fields, so these functions
//! must stay bit-identical to it.

/// Hash of a string over its UTF-16 code units, seeded at 0.
pub fn string_hash(s: &str) -> i32 {
    s.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

/// Hash of a list of strings, seeded at 1.
pub fn list_hash<S: AsRef<str>>(items: &[S]) -> i32 {
    items.iter().fold(1i32, |h, item| {
        h.wrapping_mul(31).wrapping_add(string_hash(item.as_ref()))
    })
}

/// Sign-extends a 32-bit hash into the 64-bit identity space.
fn widen(h: i32) -> u64 {
    i64::from(h) as u64
}

/// Stable 64-bit identity of a program's execution context.
///
/// Each component hash is sign-extended before the wrapping sum, so a
/// negative component yields values near `u64::MAX`. Empty components are
/// not skipped: an empty string contributes 0 and an empty argument list 1.
pub fn program_identity<S: AsRef<str>>(
    comm: &str,
    exe: &str,
    args: &[S],
    container_id: &str,
    environment_hash: &str,
) -> u64 {
    [
        string_hash(comm),
        string_hash(exe),
        list_hash(args),
        string_hash(container_id),
        string_hash(environment_hash),
    ]
    .into_iter()
    .map(widen)
    .fold(0u64, u64::wrapping_add)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_ARGS: &[&str] = &[];

    #[test]
    fn test_string_hash_reference_values() {
        assert_eq!(string_hash(""), 0);
        assert_eq!(string_hash("a"), 97);
        assert_eq!(string_hash("aa"), 3104);
        assert_eq!(string_hash("hello"), 99_162_322);
        assert_eq!(string_hash("nginx"), 104_760_218);
        assert_eq!(string_hash("curl"), 3_065_388);
    }

    #[test]
    fn test_string_hash_wraps() {
        assert_eq!(string_hash("/usr/bin/python3"), -2_066_100_795);
        assert_eq!(string_hash("/usr/sbin/nginx"), -846_889_271);
        assert_eq!(string_hash("polygenelubricants"), i32::MIN);
    }

    #[test]
    fn test_string_hash_uses_utf16_units() {
        assert_eq!(string_hash("é"), 233);
        // Surrogate pair: two code units, not one scalar value.
        assert_eq!(string_hash("😀"), 1_772_899);
    }

    #[test]
    fn test_list_hash_reference_values() {
        assert_eq!(list_hash(NO_ARGS), 1);
        assert_eq!(list_hash(&["a"]), 128);
        assert_eq!(list_hash(&["a", "b"]), 4066);
        assert_eq!(list_hash(&["-c", "print(1)"]), -1_166_342_370);
        assert_eq!(list_hash(&["--port", "8080"]), -1_615_124_048);
        assert_eq!(list_hash(&["-g", "daemon off;"]), 545_916_399);
    }

    #[test]
    fn test_list_hash_accepts_owned_strings() {
        let args = vec!["a".to_string(), "b".to_string()];
        assert_eq!(list_hash(&args), list_hash(&["a", "b"]));
    }

    #[test]
    fn test_program_identity_small() {
        assert_eq!(program_identity("a", "", NO_ARGS, "", ""), 98);
        assert_eq!(program_identity("", "", NO_ARGS, "", ""), 1);
    }

    #[test]
    fn test_program_identity_sign_extension() {
        assert_eq!(
            program_identity("nginx", "/usr/sbin/nginx", &["-g", "daemon off;"], "", ""),
            18_446_744_073_513_338_962
        );
        assert_eq!(
            program_identity(
                "python3",
                "/usr/bin/python3",
                &["app.py"],
                "3f1c2a8b9d0e",
                ""
            ),
            18_446_744_068_757_485_807
        );
    }

    #[test]
    fn test_program_identity_positive() {
        assert_eq!(
            program_identity("curl", "/usr/bin/curl", &["-s", "http://localhost"], "", ""),
            435_596_422
        );
        assert_eq!(
            program_identity("java", "/usr/bin/java", &["-jar", "app.jar"], "", ""),
            987_224_983
        );
    }

    #[test]
    fn test_program_identity_depends_on_args_order() {
        let a = program_identity("java", "/usr/bin/java", &["-jar", "app.jar"], "", "");
        let b = program_identity("java", "/usr/bin/java", &["app.jar", "-jar"], "", "");
        assert_ne!(a, b);
    }
}
