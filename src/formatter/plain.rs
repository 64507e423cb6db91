use super::OutputFormatter;
use std::io::Write;

use cryptonl::{Algorithm, AlgorithmType};

pub struct PlainFormatter;

impl PlainFormatter {
    pub fn new() -> Self {
        PlainFormatter
    }
}

impl OutputFormatter for PlainFormatter {
    fn begin_document(&mut self, _w: &mut dyn Write) -> std::io::Result<()> {
        Ok(())
    }

    fn end_document(&mut self, _w: &mut dyn Write) -> std::io::Result<()> {
        Ok(())
    }

    fn algorithm(&mut self, w: &mut dyn Write, alg: &Algorithm) -> std::io::Result<()> {
        writeln!(w, "{} {} {} {}", alg.name, alg.driver, alg.module, alg.priority)?;
        if alg.alg_type != AlgorithmType::Unknown {
            writeln!(w, "\t {}", alg.alg_type)?;
        }
        Ok(())
    }

    fn total(&mut self, w: &mut dyn Write, count: usize) -> std::io::Result<()> {
        writeln!(w, "\nTotal algorithms found: {count}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptonl::Hash;

    #[test]
    fn test_plain_output() {
        let sha1 = Algorithm {
            name: "sha1".to_string(),
            driver: "sha1-generic".to_string(),
            module: "kernel".to_string(),
            priority: 100,
            flags: 0,
            ref_count: 1,
            alg_type: AlgorithmType::Hash(Hash {
                block_size: 64,
                digest_size: 20,
                type_name: "shash".to_string(),
            }),
        };
        let stdrng = Algorithm {
            name: "stdrng".to_string(),
            driver: "drbg_nopr_sha256".to_string(),
            module: "kernel".to_string(),
            priority: 200,
            flags: 0,
            ref_count: 1,
            alg_type: AlgorithmType::Unknown,
        };

        let mut out = Vec::new();
        let mut formatter = PlainFormatter::new();
        formatter.begin_document(&mut out).unwrap();
        formatter.algorithm(&mut out, &sha1).unwrap();
        formatter.algorithm(&mut out, &stdrng).unwrap();
        formatter.total(&mut out, 2).unwrap();
        formatter.end_document(&mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "sha1 sha1-generic kernel 100\n\t shash: 20 64\nstdrng drbg_nopr_sha256 kernel 200\n\nTotal algorithms found: 2\n"
        );
    }
}
