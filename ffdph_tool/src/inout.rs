use std::io::{self, Read};

/// What to do with a token that is not a non-negative integer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Malformed {
    /// Report an error.
    Fail,
    /// Silently stop reading, keeping the keys read so far.
    Stop,
}

/// Reads whitespace-separated non-negative integer keys from `input`.
pub fn read_keys<R: Read>(mut input: R, malformed: Malformed) -> io::Result<Vec<u64>> {
    let mut text = String::new();
    input.read_to_string(&mut text)?;
    let mut keys = Vec::new();
    for (nr, token) in text.split_whitespace().enumerate() {
        match token.parse::<u64>() {
            Ok(key) => keys.push(key),
            Err(_) if malformed == Malformed::Stop => {
                log::info!("stopped reading keys at malformed token #{} {:?}", nr + 1, token);
                break;
            }
            Err(e) => return Err(io::Error::new(io::ErrorKind::InvalidData,
                format!("token #{} {:?} is not a non-negative integer: {}", nr + 1, token, e))),
        }
    }
    Ok(keys)
}

/// Returns `keys_num` pseudo-random keys less than `t*t`.
pub fn gen_keys<I: Iterator<Item = u64>>(keys_num: usize, t: usize, generator: I) -> Vec<u64> {
    let bound = (t as u64).saturating_mul(t as u64);
    generator.take(keys_num).map(|k| k % bound).collect()
}
