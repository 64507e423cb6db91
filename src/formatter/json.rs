use super::OutputFormatter;
use std::io::Write;
use serde::Serialize;

use cryptonl::Algorithm;

pub struct JsonFormatter {
    data: JsonData,
}

#[derive(Serialize)]
struct JsonData {
    algorithms: Vec<Algorithm>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total: Option<usize>,
}

impl JsonFormatter {
    pub fn new() -> Self {
        JsonFormatter {
            data: JsonData {
                algorithms: Vec::new(),
                total: None,
            },
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn begin_document(&mut self, _w: &mut dyn Write) -> std::io::Result<()> {
        Ok(())
    }

    fn end_document(&mut self, w: &mut dyn Write) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(&self.data)?;
        writeln!(w, "{json}")?;
        Ok(())
    }

    fn algorithm(&mut self, _w: &mut dyn Write, alg: &Algorithm) -> std::io::Result<()> {
        self.data.algorithms.push(alg.clone());
        Ok(())
    }

    fn total(&mut self, _w: &mut dyn Write, count: usize) -> std::io::Result<()> {
        self.data.total = Some(count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptonl::{AlgorithmType, Cipher};

    #[test]
    fn test_json_output() {
        let aes = Algorithm {
            name: "aes".to_string(),
            driver: "aes-aesni".to_string(),
            module: "aesni_intel".to_string(),
            priority: 300,
            flags: 0,
            ref_count: 1,
            alg_type: AlgorithmType::Cipher(Cipher {
                block_size: 16,
                min_key_size: 16,
                max_key_size: 32,
                type_name: "cipher".to_string(),
            }),
        };

        let mut out = Vec::new();
        let mut formatter = JsonFormatter::new();
        formatter.begin_document(&mut out).unwrap();
        formatter.algorithm(&mut out, &aes).unwrap();
        formatter.total(&mut out, 1).unwrap();
        // Nothing is written until the document ends.
        assert!(out.is_empty());
        formatter.end_document(&mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["total"], 1);
        let alg = &value["algorithms"][0];
        assert_eq!(alg["driver"], "aes-aesni");
        assert_eq!(alg["priority"], 300);
        assert_eq!(alg["type"]["kind"], "cipher");
        assert_eq!(alg["type"]["max_key_size"], 32);
    }
}
