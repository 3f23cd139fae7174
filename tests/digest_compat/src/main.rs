fn main() {
    println!("Run `cargo test -p digest-compat` to execute digest compatibility tests.");
}

// Pins the checksum text encodings and the partition geometry against fixed
// reference values. The remote upload coordinator compares checksums by
// exact string match, so any drift here breaks live uploads even if the
// digest itself is still correct.
#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;

    use partstream_chunk::{ChunkPlan, checksum_bytes, checksum_file};
    use tempfile::TempDir;

    const TEN_BYTES: &[u8] = b"0123456789";

    fn write_fixture(dir: &TempDir, data: &[u8]) -> PathBuf {
        let path = dir.path().join("fixture.bin");
        let mut f = File::create(&path).unwrap();
        f.write_all(data).unwrap();
        path
    }

    #[test]
    fn whole_file_reference_values() {
        let c = checksum_bytes(TEN_BYTES);
        assert_eq!(c.hex, "781e5e245d69b566979b86e28d23f2c7");
        assert_eq!(c.base64, "NzgxZTVlMjQ1ZDY5YjU2Njk3OWI4NmUyOGQyM2YyYzc=");
    }

    #[test]
    fn empty_input_reference_values() {
        let c = checksum_bytes(b"");
        assert_eq!(c.hex, "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(c.base64, "ZDQxZDhjZDk4ZjAwYjIwNGU5ODAwOTk4ZWNmODQyN2U=");
    }

    #[test]
    fn file_checksum_matches_in_memory() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, TEN_BYTES);
        assert_eq!(checksum_file(&path).unwrap(), checksum_bytes(TEN_BYTES));
    }

    #[test]
    fn region_reference_values() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, TEN_BYTES);

        let mut plan = ChunkPlan::new(&path, 3);
        plan.open().unwrap();

        // 10 bytes at chunk size 3: regions of 3, 3, 3 and 1 bytes.
        let expected_hex = [
            "d2490f048dc3b77a457e3e450ab4eb38", // "012"
            "d81f9c1be2e08964bf9f24b15f0e4900", // "345"
            "9fe8593a8a330607d76796b35c64c600", // "678"
            "45c48cce2e2d7fbdea1afc51c7c6ad26", // "9"
        ];

        let regions = plan.readers().unwrap();
        assert_eq!(regions.len(), 4);
        for (region, expected) in regions.iter().zip(expected_hex) {
            assert_eq!(region.md5().unwrap().hex, expected);
        }

        let whole = plan.md5().unwrap();
        assert_eq!(whole.hex, "781e5e245d69b566979b86e28d23f2c7");

        plan.close().unwrap();
    }

    #[test]
    fn partition_geometry_reference() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, TEN_BYTES);

        let mut plan = ChunkPlan::new(&path, 3);
        plan.open().unwrap();

        assert_eq!(plan.size(), 10);
        assert_eq!(plan.chunk_count(), 4);
        let sizes: Vec<i64> = plan.readers().unwrap().iter().map(|r| r.size()).collect();
        assert_eq!(sizes, vec![3, 3, 3, 1]);
    }

    #[test]
    fn base64_is_encoded_over_hex_text() {
        // 32 hex characters always encode to 44 base64 characters; raw
        // 16-byte digests would encode to 24. Guards against an accidental
        // "fix" of the encoding.
        let c = checksum_bytes(TEN_BYTES);
        assert_eq!(c.base64.len(), 44);
    }
}
