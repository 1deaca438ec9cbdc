use libduckdb_sys::duckdb_string_t;

/// Decode a DuckDB string value into a Rust-owned `String`.
///
/// # Safety
///
/// `s` must come from a non-NULL `duckdb_string_t` vector row provided by
/// DuckDB for the active scalar invocation. Callers must perform row null checks
/// before invoking this function.
pub unsafe fn decode_duckdb_string(s: &duckdb_string_t) -> String {
    // SAFETY: Both union variants start with the length field.
    let len = unsafe { s.value.inlined.length } as usize;
    if len == 0 {
        return String::new();
    }

    let bytes = if len <= 12 {
        // SAFETY: Strings of up to 12 bytes are stored inline with `len` initialized bytes.
        let inlined = unsafe { &s.value.inlined.inlined };
        unsafe { std::slice::from_raw_parts(inlined.as_ptr() as *const u8, len) }
    } else {
        // SAFETY: Longer strings point at `len` bytes owned by the vector.
        let ptr = unsafe { s.value.pointer.ptr };
        unsafe { std::slice::from_raw_parts(ptr as *const u8, len) }
    };
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use libduckdb_sys::{
        duckdb_string_t__bindgen_ty_1, duckdb_string_t__bindgen_ty_1__bindgen_ty_1,
        duckdb_string_t__bindgen_ty_1__bindgen_ty_2,
    };
    use std::os::raw::c_char;

    fn inlined(bytes: &[u8]) -> duckdb_string_t {
        let mut inlined = [0 as c_char; 12];
        for (dst, src) in inlined.iter_mut().zip(bytes.iter().copied()) {
            *dst = src as c_char;
        }

        duckdb_string_t {
            value: duckdb_string_t__bindgen_ty_1 {
                inlined: duckdb_string_t__bindgen_ty_1__bindgen_ty_2 {
                    length: bytes.len() as u32,
                    inlined,
                },
            },
        }
    }

    fn pointer(bytes: &mut [u8]) -> duckdb_string_t {
        let mut prefix = [0 as c_char; 4];
        for (dst, src) in prefix.iter_mut().zip(bytes.iter().copied()) {
            *dst = src as c_char;
        }

        duckdb_string_t {
            value: duckdb_string_t__bindgen_ty_1 {
                pointer: duckdb_string_t__bindgen_ty_1__bindgen_ty_1 {
                    length: bytes.len() as u32,
                    prefix,
                    ptr: bytes.as_mut_ptr() as *mut c_char,
                },
            },
        }
    }

    #[test]
    fn test_decode_short_identifier_fragment() {
        // SAFETY: fixture is a valid inlined string.
        assert_eq!(unsafe { decode_duckdb_string(&inlined(b"XGID=")) }, "XGID=");
        assert_eq!(unsafe { decode_duckdb_string(&inlined(b"")) }, "");
    }

    #[test]
    fn test_decode_full_identifier() {
        let xgid = "XGID=-b----E-C---eE---c-e----B-:0:0:1:00:0:0:0:7:10";
        let mut backing = xgid.as_bytes().to_vec();
        let input = pointer(backing.as_mut_slice());
        // SAFETY: backing storage outlives the decode call.
        assert_eq!(unsafe { decode_duckdb_string(&input) }, xgid);
    }

    #[test]
    fn test_decode_invalid_utf8_is_lossy() {
        let mut backing = b"XGID=abcdefghij".to_vec();
        backing[6] = 0xff;
        let expected = String::from_utf8_lossy(&backing).into_owned();
        let input = pointer(backing.as_mut_slice());
        // SAFETY: backing storage outlives the decode call.
        assert_eq!(unsafe { decode_duckdb_string(&input) }, expected);
    }
}
