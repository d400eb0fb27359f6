// ammswap-submitter: assembles one AMM swap for a wallet and submits it.
// Reads the wallet's token accounts over RPC, builds create → swap → close
// and sends it as a single transaction.

mod rpc;

use ammswap_sdk::constants::{LIQUIDITY_POOL_PROGRAM_ID_V4, SERUM_PROGRAM_ID_V3};
use ammswap_sdk::{
    AssembledSwap, AssemblyOptions, FeeCollection, Fees, PoolDescriptor, PoolKeys, SwapAssembler,
    SwapRequest, TokenAmount,
};
use rpc::RpcAccountSource;
use rust_decimal::Decimal;
use solana_client::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_sdk::{
    commitment_config::{CommitmentConfig, CommitmentLevel},
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair, Signer},
    transaction::Transaction,
};
use std::str::FromStr;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// ── Configuration ───────────────────────────────────────────────────────────

struct SubmitterConfig {
    rpc_url: String,
    owner: Keypair,
    pool: PoolDescriptor,
    input_mint: Pubkey,
    output_mint: Pubkey,
    amount_in: TokenAmount,
    minimum_amount_out: TokenAmount,
    source_account: Option<Pubkey>,
    destination_account: Option<Pubkey>,
    options: AssemblyOptions,
    skip_preflight: bool,
    dry_run: bool,
}

fn required(name: &str) -> Result<String, String> {
    std::env::var(name).map_err(|_| format!("{} is not set", name))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_pubkey(name: &str, value: &str) -> Result<Pubkey, String> {
    Pubkey::from_str(value).map_err(|e| format!("Invalid {}: {}", name, e))
}

fn parse_flag(name: &str, value: Option<String>) -> Result<bool, String> {
    match value.as_deref() {
        None | Some("0") | Some("false") => Ok(false),
        Some("1") | Some("true") => Ok(true),
        Some(other) => Err(format!("Invalid {}: {}", name, other)),
    }
}

fn parse_amount(name: &str, value: &str, decimals: &str) -> Result<TokenAmount, String> {
    let magnitude =
        Decimal::from_str(value).map_err(|e| format!("Invalid {}: {}", name, e))?;
    let decimals: u8 = decimals
        .parse()
        .map_err(|e| format!("Invalid decimals for {}: {}", name, e))?;
    TokenAmount::from_ui(magnitude, decimals).map_err(|e| format!("Invalid {}: {}", name, e))
}

/// Fee collection is enabled by FEE_RECEIVER; the fraction is then required.
fn parse_fee(
    receiver: Option<String>,
    numerator: Option<String>,
    denominator: Option<String>,
) -> Result<Option<FeeCollection>, String> {
    let receiver = match receiver {
        Some(receiver) => parse_pubkey("FEE_RECEIVER", &receiver)?,
        None => return Ok(None),
    };
    let numerator: u64 = numerator
        .ok_or("FEE_NUMERATOR is required with FEE_RECEIVER")?
        .parse()
        .map_err(|e| format!("Invalid FEE_NUMERATOR: {}", e))?;
    let denominator: u64 = denominator
        .ok_or("FEE_DENOMINATOR is required with FEE_RECEIVER")?
        .parse()
        .map_err(|e| format!("Invalid FEE_DENOMINATOR: {}", e))?;

    let fees = Fees {
        trade_fee_numerator: numerator,
        trade_fee_denominator: denominator,
        ..Fees::default()
    };
    fees.validate()
        .map_err(|e| format!("Invalid fee {}/{}: {}", numerator, denominator, e))?;
    Ok(Some(FeeCollection { receiver, fees }))
}

fn load_pool(path: &str) -> Result<PoolDescriptor, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read pool keys from {}: {}", path, e))?;
    let keys: PoolKeys = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse pool keys in {}: {}", path, e))?;
    PoolDescriptor::try_from(&keys).map_err(|e| format!("Incomplete pool keys in {}: {}", path, e))
}

impl SubmitterConfig {
    fn from_env() -> Result<Self, String> {
        let rpc_url =
            std::env::var("RPC_URL").unwrap_or_else(|_| "http://localhost:8899".to_string());

        let keypair_path = std::env::var("OWNER_KEYPAIR_PATH")
            .unwrap_or_else(|_| "owner-keypair.json".to_string());
        let owner = read_keypair_file(&keypair_path)
            .map_err(|e| format!("Failed to read keypair from {}: {}", keypair_path, e))?;

        let pool_path =
            std::env::var("POOL_KEYS_PATH").unwrap_or_else(|_| "pool-keys.json".to_string());
        let pool = load_pool(&pool_path)?;

        let input_mint = parse_pubkey("INPUT_MINT", &required("INPUT_MINT")?)?;
        let output_mint = parse_pubkey("OUTPUT_MINT", &required("OUTPUT_MINT")?)?;

        let amount_in = parse_amount(
            "AMOUNT_IN",
            &required("AMOUNT_IN")?,
            &required("INPUT_DECIMALS")?,
        )?;
        let minimum_amount_out = parse_amount(
            "MIN_AMOUNT_OUT",
            &required("MIN_AMOUNT_OUT")?,
            &required("OUTPUT_DECIMALS")?,
        )?;

        let source_account = optional("SOURCE_ACCOUNT")
            .map(|v| parse_pubkey("SOURCE_ACCOUNT", &v))
            .transpose()?;
        let destination_account = optional("DESTINATION_ACCOUNT")
            .map(|v| parse_pubkey("DESTINATION_ACCOUNT", &v))
            .transpose()?;

        let mut options = AssemblyOptions::default();
        if let Some(reserve) = optional("WRAP_RESERVE_LAMPORTS") {
            options.wrap_reserve_lamports = reserve
                .parse()
                .map_err(|e| format!("Invalid WRAP_RESERVE_LAMPORTS: {}", e))?;
        }
        options.fee = parse_fee(
            optional("FEE_RECEIVER"),
            optional("FEE_NUMERATOR"),
            optional("FEE_DENOMINATOR"),
        )?;

        let skip_preflight = parse_flag("SKIP_PREFLIGHT", optional("SKIP_PREFLIGHT"))?;
        let dry_run = parse_flag("DRY_RUN", optional("DRY_RUN"))?;

        Ok(Self {
            rpc_url,
            owner,
            pool,
            input_mint,
            output_mint,
            amount_in,
            minimum_amount_out,
            source_account,
            destination_account,
            options,
            skip_preflight,
            dry_run,
        })
    }
}

// ── Submission ──────────────────────────────────────────────────────────────

fn report(swap: &AssembledSwap) {
    info!(
        source = %swap.source_account,
        destination = %swap.destination_account,
        native_balance = swap.native_balance,
        "resolved accounts"
    );
    for account in &swap.auxiliary_accounts {
        warn!(
            account = %account.address,
            mint = %account.mint,
            amount = account.amount,
            "funded non-canonical token account left untouched"
        );
    }
    for (i, ix) in swap.instructions.iter().enumerate() {
        info!(
            index = i,
            program = %ix.program_id,
            accounts = ix.accounts.len(),
            data_len = ix.data.len(),
            "instruction"
        );
    }
}

/// Pools outside the known AMM v4 / order-book v3 deployments are allowed but flagged.
fn check_pool_programs(pool: &PoolDescriptor) -> bool {
    let known = pool.amm_program_id == LIQUIDITY_POOL_PROGRAM_ID_V4
        && pool.serum_program_id == SERUM_PROGRAM_ID_V3;
    if known {
        info!(
            amm_program = %pool.amm_program_id,
            serum_program = %pool.serum_program_id,
            "pool programs"
        );
    } else {
        warn!(
            amm_program = %pool.amm_program_id,
            serum_program = %pool.serum_program_id,
            "pool does not use the AMM v4 / order-book v3 programs"
        );
    }
    known
}

fn run(config: SubmitterConfig) -> Result<(), String> {
    let owner = config.owner.pubkey();
    let client = RpcClient::new_with_commitment(config.rpc_url.clone(), CommitmentConfig::confirmed());
    let source = RpcAccountSource::new(&client);
    check_pool_programs(&config.pool);

    let request = SwapRequest {
        owner,
        pool: config.pool,
        input_mint: config.input_mint,
        output_mint: config.output_mint,
        amount_in: config.amount_in,
        minimum_amount_out: config.minimum_amount_out,
        source_account: config.source_account,
        destination_account: config.destination_account,
    };

    info!(
        %owner,
        rpc = %config.rpc_url,
        input_mint = %request.input_mint,
        output_mint = %request.output_mint,
        amount_in = %request.amount_in,
        minimum_amount_out = %request.minimum_amount_out,
        "assembling swap"
    );

    let swap = SwapAssembler::with_options(&source, config.options)
        .assemble(&request)
        .map_err(|e| format!("Assembly failed: {}", e))?;
    report(&swap);

    if config.dry_run {
        info!(
            signers = swap.required_signers().len(),
            "DRY_RUN set, not submitting"
        );
        return Ok(());
    }

    let blockhash = client
        .get_latest_blockhash()
        .map_err(|e| format!("Failed to fetch blockhash: {}", e))?;

    let mut signers: Vec<&dyn Signer> = vec![&config.owner];
    signers.extend(swap.signers.iter().map(|k| k as &dyn Signer));
    let tx = Transaction::new_signed_with_payer(
        &swap.instructions,
        Some(&owner),
        &signers,
        blockhash,
    );

    let signature = client
        .send_and_confirm_transaction_with_spinner_and_config(
            &tx,
            CommitmentConfig::confirmed(),
            RpcSendTransactionConfig {
                skip_preflight: config.skip_preflight,
                preflight_commitment: Some(CommitmentLevel::Confirmed),
                ..RpcSendTransactionConfig::default()
            },
        )
        .map_err(|e| format!("Swap transaction failed: {}", e))?;

    info!(%signature, "swap confirmed");
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .init();
}

// ── Main ────────────────────────────────────────────────────────────────────

fn main() {
    init_tracing();

    let config = match SubmitterConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            eprintln!();
            eprintln!("Required environment variables:");
            eprintln!("  INPUT_MINT             Mint of the token being sold");
            eprintln!("  OUTPUT_MINT            Mint of the token being bought");
            eprintln!("  AMOUNT_IN              Input amount in UI units (e.g. 0.0001)");
            eprintln!("  INPUT_DECIMALS         Decimals of the input mint");
            eprintln!("  MIN_AMOUNT_OUT         Minimum acceptable output in UI units");
            eprintln!("  OUTPUT_DECIMALS        Decimals of the output mint");
            eprintln!();
            eprintln!("Optional environment variables:");
            eprintln!("  RPC_URL                RPC endpoint (default: http://localhost:8899)");
            eprintln!("  OWNER_KEYPAIR_PATH     Wallet keypair (default: owner-keypair.json)");
            eprintln!("  POOL_KEYS_PATH         Pool keys JSON (default: pool-keys.json)");
            eprintln!("  SOURCE_ACCOUNT         Use this input token account");
            eprintln!("  DESTINATION_ACCOUNT    Use this output token account");
            eprintln!("  WRAP_RESERVE_LAMPORTS  Extra lamports on wrapped input (default: 10000000)");
            eprintln!("  FEE_RECEIVER           Output-mint token account receiving the platform fee");
            eprintln!("  FEE_NUMERATOR          Fee fraction numerator (with FEE_RECEIVER)");
            eprintln!("  FEE_DENOMINATOR        Fee fraction denominator (with FEE_RECEIVER)");
            eprintln!("  SKIP_PREFLIGHT         Skip simulation before sending (default: false)");
            eprintln!("  DRY_RUN                Assemble and print, do not submit (default: false)");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config) {
        error!("{}", e);
        std::process::exit(1);
    }
}
