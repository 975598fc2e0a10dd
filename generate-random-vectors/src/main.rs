use clap::Parser;
use nsg_harness::{records::write_records, test_util::random_vectors, Result};

/// Write uniformly random vectors as an .fvecs file.
#[derive(Parser, Debug)]
struct Command {
    output: String,
    num_vecs: usize,

    #[arg(long, default_value_t = 128)]
    vector_size: usize,
    #[arg(long, default_value_t = 0x533D)]
    seed: u64,
}

fn main() -> Result<()> {
    let args = Command::parse();
    let vectors = random_vectors(args.num_vecs, args.vector_size, args.seed);
    write_records(&args.output, vectors.data(), vectors.dim())?;
    eprintln!("wrote {} vectors to {}", vectors.num_vecs(), args.output);

    Ok(())
}
