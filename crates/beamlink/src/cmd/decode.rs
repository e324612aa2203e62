use beamlink_protocol::{decode_packet_info, validate};

use crate::cmd::DecodeArgs;
use crate::exit::{protocol_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_packet, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = match (&args.hex, &args.file) {
        (Some(hex), None) => parse_hex(hex)?,
        (None, Some(path)) => std::fs::read(path)
            .map_err(|err| CliError::new(USAGE, format!("cannot read {}: {err}", path.display())))?,
        _ => {
            return Err(CliError::new(
                USAGE,
                "provide packet bytes as a hex argument or via --file",
            ))
        }
    };

    let validation = validate(&bytes);
    let info = decode_packet_info(&bytes).map_err(|err| protocol_error("decode failed", err))?;
    print_packet(bytes.len(), &info, &validation, format);

    if validation.valid {
        Ok(SUCCESS)
    } else {
        Ok(DATA_INVALID)
    }
}

fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.len() % 2 != 0 {
        return Err(CliError::new(USAGE, "hex input has an odd number of digits"));
    }
    (0..cleaned.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&cleaned[i..i + 2], 16)
                .map_err(|_| CliError::new(USAGE, format!("invalid hex at offset {i}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_spaced_hex() {
        assert_eq!(
            parse_hex("80 02 00 ff").expect("hex should parse"),
            vec![0x80, 0x02, 0x00, 0xff]
        );
    }

    #[test]
    fn rejects_odd_length() {
        assert!(parse_hex("abc").is_err());
    }

    #[test]
    fn rejects_non_hex_digits() {
        assert!(parse_hex("zz").is_err());
    }
}
