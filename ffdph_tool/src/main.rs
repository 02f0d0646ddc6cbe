#![doc = include_str!("../README.md")]

mod inout;
use inout::{read_keys, gen_keys, Malformed};

use std::{fs::File, io::{BufWriter, Write}, path::PathBuf};
use anyhow::{bail, Context};
use butils::XorShift64;
use clap::{Parser, ValueEnum};
use dyn_size_of::GetSize;
use ffdph::{BuildConf, Function, stats::BuildStatsPrinter};

#[allow(non_camel_case_types)]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum KeySource {
    /// Whitespace-separated integers read from the key file
    file,
    /// Generate 64 bit keys with xor-shift 64, reduced modulo t*t
    xs64,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
/// First-fit decreasing perfect hash function builder.
pub struct Conf {
    /// Name of the file of keys, or - for the standard input
    #[arg(default_value = "-")]
    pub key_file: String,

    /// Number of rows and columns of the key matrix, t*t must exceed the maximum key
    #[arg(short='t', long="row-len", value_parser = clap::value_parser!(u64).range(1..))]
    pub t: u64,

    /// Upper bound on the hash table size (t*t+t+1 by default, which always suffices)
    #[arg(short='c', long)]
    pub capacity: Option<usize>,

    /// Print the displacement of each row and the whole hash table
    #[arg(short='v', long, default_value_t = false)]
    pub verbose: bool,

    /// Print construction events (ingested keys, displacement of each row)
    #[arg(short='e', long, default_value_t = false)]
    pub events: bool,

    /// Stop reading keys at the first malformed token instead of failing
    #[arg(short='l', long, default_value_t = false)]
    pub lenient: bool,

    #[arg(short='s', long, value_enum, default_value_t = KeySource::file)]
    pub key_source: KeySource,

    /// The number of random keys to generate
    #[arg(short='n', long)]
    pub keys_num: Option<usize>,

    /// Check that every key is found at its place in the built table
    #[arg(long, default_value_t = false)]
    pub verify: bool,

    /// Write the built function to this file
    #[arg(short='o', long)]
    pub output: Option<PathBuf>,
}

fn keys(conf: &Conf) -> anyhow::Result<Vec<u64>> {
    let malformed = if conf.lenient { Malformed::Stop } else { Malformed::Fail };
    Ok(match conf.key_source {
        KeySource::xs64 => {
            let Some(keys_num) = conf.keys_num else { bail!("--keys-num is required to generate keys") };
            gen_keys(keys_num, conf.t as usize, XorShift64(1234))
        }
        KeySource::file if conf.key_file == "-" =>
            read_keys(std::io::stdin().lock(), malformed).context("cannot read keys from the standard input")?,
        KeySource::file => {
            let file = File::open(&conf.key_file).with_context(|| format!("cannot open {}", conf.key_file))?;
            read_keys(file, malformed).with_context(|| format!("cannot read keys from {}", conf.key_file))?
        }
    })
}

/// Checks that each key is found at its row displacement plus column.
fn verify(f: &Function, keys: &[u64]) -> anyhow::Result<()> {
    let t = f.row_len() as u64;
    for &key in keys {
        let expected = f.displacement((key / t) as usize).and_then(|d| d.checked_add((key % t) as usize));
        match f.get(key) {
            None => bail!("key {} is not found", key),
            Some(index) if Some(index) != expected => bail!("key {} is at {} instead of {:?}", key, index, expected),
            Some(_) => {}
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let conf: Conf = Conf::parse();
    let t = usize::try_from(conf.t).context("t does not fit in memory")?;
    let build_conf = match conf.capacity {
        Some(capacity) => BuildConf::new(t, capacity),
        None => BuildConf::sufficient(t),
    }?;
    let keys = keys(&conf)?;
    log::info!("building for {} keys, t={}, capacity={}", keys.len(), t, build_conf.capacity());
    let f = if conf.events {
        let mut printer = BuildStatsPrinter::stdout();
        let f = Function::try_with_conf_stats(keys.iter().copied(), build_conf, &mut printer)?;
        printer.into_inner().context("cannot print construction events")?;
        f
    } else {
        Function::try_with_conf(keys.iter().copied(), build_conf)?
    };
    if conf.verbose {
        print!("{}", f.report());
    } else {
        println!("{}", f.summary());
    }
    if conf.verify {
        verify(&f, &keys)?;
        println!("verified {} keys", keys.len());
    }
    if let Some(ref path) = conf.output {
        let mut output = BufWriter::new(File::create(path).with_context(|| format!("cannot create {}", path.display()))?);
        f.write(&mut output).and_then(|()| output.flush()).with_context(|| format!("cannot write {}", path.display()))?;
        println!("written {} bytes (in memory: {} bytes)", f.write_bytes(), f.size_bytes());
    }
    Ok(())
}
