mod args;
mod commands;
mod utils;

use args::{args, ask, Arguments, ArgumentsParser};
use krbticket::communication::KdcComm;
use krbticket::core::{KdcExchange, SequenceGenerator};
use krbticket::error::Result;
use log::error;

fn init_log(verbosity: usize) {
    if let Err(err) = stderrlog::new()
        .module(module_path!())
        .verbosity(verbosity + 2)
        .init()
    {
        eprintln!("Unable to init log: {}", err);
    }
}

fn main() {
    let args = ArgumentsParser::parse(&args().get_matches());

    if let Err(error) = main_inner(args) {
        error!("{}", error);
        std::process::exit(1);
    }
}

fn main_inner(args: Arguments) -> Result<()> {
    match args {
        Arguments::Ask(args) => ask_command(args),
    }
}

fn ask_command(args: ask::Arguments) -> Result<()> {
    init_log(args.verbosity);

    let credential_format = utils::get_cred_format(
        args.credential_format,
        args.creds_file.as_ref(),
    );
    let creds_file = utils::get_ticket_file(
        args.creds_file,
        &args.user.name,
        &credential_format,
    );

    let kdccomm =
        KdcComm::new(args.kdcs, args.dns_servers).udp_timeout(args.udp_timeout);
    let sequence = SequenceGenerator::new()?;
    let exchange = KdcExchange::new(&kdccomm, &sequence)
        .with_initial_protocol(args.transport_protocol);

    return commands::ask(
        args.user,
        args.user_key,
        args.service,
        credential_format,
        &creds_file,
        &exchange,
    );
}
