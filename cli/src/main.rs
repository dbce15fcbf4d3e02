use std::{error::Error, fs::File, io::Write};

use log::{info, warn};
use xnl_netlist::Design;
use xnl_xnf::{OnError, TaggedDevices, XnfioOptions};

fn read_input(name: String) -> Result<Design, Box<dyn Error>> {
    if name.is_empty() {
        panic!("no input provided")
    }
    Ok(xnl_netlist::parse(&std::fs::read_to_string(name)?)?)
}

fn write_output(design: Design, name: String) -> Result<(), Box<dyn Error>> {
    if name.is_empty() {
        print!("{design}");
        println!("; device counts:");
        for (class, amount) in design.statistics() {
            println!("; {:>7} {}", amount, class);
        }
    } else {
        write!(&mut File::create(name)?, "{design}")?;
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn Error>> {
    let mut version = false;
    let mut skip_tagged = false;
    let mut keep_going = false;
    let mut input = String::new();
    let mut output = String::new();
    {
        let mut parser = argparse::ArgumentParser::new();
        parser.set_description("Insert and tag XNF pad buffers in a netlist");
        parser.refer(&mut version).add_option(&["--version"], argparse::StoreTrue, "Display version");
        parser.refer(&mut skip_tagged).add_option(
            &["--skip-tagged"],
            argparse::StoreTrue,
            "Do not reuse devices that already have an XNF-LCA mapping",
        );
        parser.refer(&mut keep_going).add_option(
            &["-k", "--keep-going"],
            argparse::StoreTrue,
            "Skip pads that cannot be buffered instead of stopping",
        );
        parser.refer(&mut input).add_argument("INPUT", argparse::Store, "Input file");
        parser.refer(&mut output).add_argument("OUTPUT", argparse::Store, "Output file");
        parser.parse_args_or_exit();
    }

    if version {
        println!("xnl {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let options = XnfioOptions {
        tagged_devices: if skip_tagged { TaggedDevices::Skip } else { TaggedDevices::Retag },
        on_error: if keep_going { OnError::SkipNet } else { OnError::Abort },
    };

    let mut design = read_input(input)?;
    info!("read {} nets and {} devices", design.net_count(), design.device_count());
    let result = xnl_xnf::xnfio_with(&mut design, options);
    if !keep_going {
        result.clone()?;
    }
    for link in design.unnamed_rings() {
        warn!("ring of {:?} has no net", design.link_owner(link));
    }
    write_output(design, output)?;
    Ok(result?)
}

fn main() {
    env_logger::init();
    if let Err(error) = run() {
        eprintln!("error: {}", error);
        std::process::exit(1)
    }
}
