mod parsers;

use std::io::Write;
use std::path::PathBuf;

use bulkoptics_data::EfficiencyTableSet;
use clap::Parser;

/// Pack plain-text efficiency tables into a compressed table set.
#[derive(Parser, Debug)]
#[command(name = "bulkoptics-generate")]
#[command(version)]
struct Cli {
    /// Efficiency tables exported by a Mie code, one per file.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Output path of the postcard + zstd blob.
    #[arg(short, long)]
    output: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    let (inputs, out_path) = (cli.inputs, cli.output);

    println!("Parsing {} efficiency tables...", inputs.len());
    let mut tables = Vec::with_capacity(inputs.len());
    for path in &inputs {
        let table = parsers::parse_table_file(path).unwrap_or_else(|e| {
            eprintln!("Error: {e}");
            std::process::exit(1);
        });
        println!(
            "  {:?}: m = {}{:+}i, λ = {} nm, n_medium = {}, {} diameters",
            path.file_name().unwrap_or(path.as_os_str()),
            table.refractive_index_re,
            table.refractive_index_im,
            table.wavelength,
            table.medium_index,
            table.diameter.len()
        );
        tables.push(table);
    }

    let set = EfficiencyTableSet {
        version: env!("CARGO_PKG_VERSION").to_string(),
        tables,
    };

    println!("\nSerializing with postcard...");
    let serialized = postcard::to_allocvec(&set).expect("postcard serialization failed");
    println!("  Serialized size: {} bytes", serialized.len());

    println!("Compressing with zstd (level 19)...");
    let compressed = zstd::encode_all(&serialized[..], 19).expect("zstd compression failed");
    println!(
        "  Compressed size: {} bytes ({:.1}x)",
        compressed.len(),
        serialized.len() as f64 / compressed.len() as f64
    );

    if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).expect("failed to create output directory");
    }
    let mut f = std::fs::File::create(&out_path).expect("failed to create output file");
    f.write_all(&compressed)
        .expect("failed to write compressed data");
    println!("\nWrote {:?}", out_path);

    println!("Verifying round-trip deserialization...");
    let decompressed = zstd::decode_all(&compressed[..]).expect("zstd decompression failed");
    assert_eq!(decompressed.len(), serialized.len());
    let set2: EfficiencyTableSet =
        postcard::from_bytes(&decompressed).expect("postcard deserialization failed");
    assert_eq!(set2.tables.len(), set.tables.len());
    println!("  Round-trip OK!");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_takes_inputs_and_output() {
        let args = ["bulkoptics-generate", "a.txt", "b.txt", "-o", "out.bin.zst"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.inputs, vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
        assert_eq!(cli.output, PathBuf::from("out.bin.zst"));

        let args = ["bulkoptics-generate", "--output", "x.zst", "t.txt"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.inputs.len(), 1);
    }

    #[test]
    fn test_cli_rejects_missing_arguments() {
        assert!(Cli::try_parse_from(["bulkoptics-generate", "-o", "out.zst"]).is_err());
        assert!(Cli::try_parse_from(["bulkoptics-generate", "a.txt"]).is_err());
        assert!(Cli::try_parse_from(["bulkoptics-generate", "a.txt", "-o"]).is_err());
    }
}
