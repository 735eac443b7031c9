//! `locus inspect`
//!
//! Lists the shipped interface descriptors, or answers whether a selector
//! belongs to one.

use clap::Args;
use locus::introspect::{
    protocol_named, selector_conforms_to_protocol,
    selector_is_in_list_of_protocol_methods_with_props, ProtocolDescriptor, PROTOCOLS,
};

use crate::error::CliError;

/// Arguments for `inspect`.
#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Protocol name (case-insensitive); lists all protocols when omitted
    protocol: Option<String>,

    /// Selector to look up in the protocol
    selector: Option<String>,

    /// Only match required (true) or optional (false) methods
    #[arg(long)]
    required: Option<bool>,

    /// Only match instance (true) or type-level (false) methods
    #[arg(long)]
    instance: Option<bool>,
}

/// Run the inspect command.
pub fn run(args: InspectArgs) -> Result<(), CliError> {
    let Some(name) = args.protocol else {
        for protocol in PROTOCOLS {
            print_protocol(protocol);
            println!();
        }
        return Ok(());
    };

    let protocol = protocol_named(&name).ok_or(CliError::UnknownProtocol(name))?;
    match args.selector {
        None => print_protocol(protocol),
        Some(selector) => {
            let found = is_declared(&selector, protocol, args.required, args.instance);
            println!(
                "{} {} {}",
                selector,
                if found { "is declared by" } else { "is not declared by" },
                protocol.name
            );
        }
    }
    Ok(())
}

/// Whether `selector` is declared, constrained by whichever properties are given.
fn is_declared(
    selector: &str,
    protocol: &ProtocolDescriptor,
    required: Option<bool>,
    instance: Option<bool>,
) -> bool {
    match (required, instance) {
        (None, None) => selector_conforms_to_protocol(selector, protocol),
        (required, instance) => {
            let required = required.map_or(vec![true, false], |r| vec![r]);
            let instance = instance.map_or(vec![true, false], |i| vec![i]);
            required.iter().any(|r| {
                instance.iter().any(|i| {
                    selector_is_in_list_of_protocol_methods_with_props(selector, protocol, *r, *i)
                })
            })
        }
    }
}

fn print_protocol(protocol: &ProtocolDescriptor) {
    println!("{}", protocol.name);
    for method in protocol.methods {
        println!(
            "  {:<26} {:<8} {}",
            method.selector,
            if method.required { "required" } else { "optional" },
            if method.instance { "instance" } else { "type" }
        );
    }
}
