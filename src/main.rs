// zk-ballot command line
// Key setup, client-side proving and an in-process election simulation

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use zk_ballot::{
    CircuitId, CircuitKeyStore, Clock, CommitmentScheme, ContractProof, Election, ElectionConfig, ElectionMode,
    FieldElement, Groth16Prover, Groth16Verifier, ManualClock, Phase, Principal, ProofBridge, ProofVerifier,
    SnarkProof, SystemClock,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "zk-ballot")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate proving and verifying keys
    Setup {
        #[arg(short, long, default_value = "./ballot_keys")]
        keys_dir: PathBuf,
        /// Only set up this circuit (vote, reveal, open_ballot)
        #[arg(short, long)]
        circuit: Option<String>,
    },
    /// Create a voter secret and its registration commitment
    Commit {
        /// Decimal secret; a random one is drawn when omitted
        #[arg(short, long)]
        secret: Option<String>,
    },
    /// Prove a hidden commit-reveal vote
    ProveVote {
        #[arg(short, long, default_value = "./ballot_keys")]
        keys_dir: PathBuf,
        #[arg(short, long)]
        secret: String,
        #[arg(short, long)]
        option: u32,
        /// Decimal salt; a random one is drawn when omitted
        #[arg(long)]
        salt: Option<String>,
    },
    /// Prove the reveal of a hidden vote
    ProveReveal {
        #[arg(short, long, default_value = "./ballot_keys")]
        keys_dir: PathBuf,
        #[arg(short, long)]
        secret: String,
        #[arg(short, long)]
        option: u32,
        #[arg(long)]
        salt: String,
    },
    /// Prove a single-phase open ballot vote
    ProveOpen {
        #[arg(short, long, default_value = "./ballot_keys")]
        keys_dir: PathBuf,
        #[arg(short, long)]
        secret: String,
        #[arg(short, long)]
        option: u32,
    },
    /// Verify a proof file against public signals
    Verify {
        #[arg(short, long, default_value = "./ballot_keys")]
        keys_dir: PathBuf,
        #[arg(short, long)]
        circuit: String,
        /// JSON proof file
        #[arg(short, long)]
        proof: PathBuf,
        /// Comma separated decimal public signals, in circuit order
        #[arg(long)]
        signals: String,
        /// Proof file is in snarkjs layout rather than contract layout
        #[arg(long)]
        snarkjs: bool,
    },
    /// Run a complete election in-process with real proofs
    Simulate {
        /// Election config file; overrides --mode and --options
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(short, long, default_value = "./ballot_keys")]
        keys_dir: PathBuf,
        #[arg(short, long, value_enum, default_value = "commit-reveal")]
        mode: SimulationMode,
        #[arg(short, long, default_value = "3")]
        options: u32,
        #[arg(short, long, default_value = "5")]
        voters: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SimulationMode {
    CommitReveal,
    OpenBallot,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Setup { keys_dir, circuit } => run_setup(keys_dir, circuit).await,
        Commands::Commit { secret } => run_commit(secret),
        Commands::ProveVote { keys_dir, secret, option, salt } => {
            run_prove_vote(keys_dir, secret, option, salt).await
        }
        Commands::ProveReveal { keys_dir, secret, option, salt } => {
            run_prove_reveal(keys_dir, secret, option, salt).await
        }
        Commands::ProveOpen { keys_dir, secret, option } => run_prove_open(keys_dir, secret, option).await,
        Commands::Verify { keys_dir, circuit, proof, signals, snarkjs } => {
            run_verify(keys_dir, circuit, proof, signals, snarkjs).await
        }
        Commands::Simulate { config, keys_dir, mode, options, voters } => {
            run_simulation(config, keys_dir, mode, options, voters).await
        }
    }
}

async fn run_setup(keys_dir: PathBuf, circuit: Option<String>) -> Result<()> {
    let store = CircuitKeyStore::new(&keys_dir);
    let mut rng = StdRng::from_entropy();

    match circuit {
        Some(name) => {
            let id: CircuitId = name.parse()?;
            store.setup_circuit(id, &mut rng).await?;
        }
        None => {
            store.setup_all(&mut rng).await?;
        }
    }

    let manifest = store.load_manifest().await?;
    println!("{}", serde_json::to_string_pretty(&manifest)?);
    Ok(())
}

fn parse_field(label: &str, value: &str) -> Result<FieldElement> {
    FieldElement::from_decimal(value).with_context(|| format!("invalid {}", label))
}

fn run_commit(secret: Option<String>) -> Result<()> {
    let secret = match secret {
        Some(value) => parse_field("secret", &value)?,
        None => FieldElement::random(&mut rand::thread_rng()),
    };
    let scheme = CommitmentScheme::poseidon();

    let output = json!({
        "secret": secret,
        "commitment": scheme.derive_commitment(&secret)?,
        "nullifier": scheme.derive_nullifier_default(&secret)?,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn load_bridge(keys_dir: &Path, circuits: &[CircuitId]) -> Result<ProofBridge> {
    let store = CircuitKeyStore::new(keys_dir);
    let prover = Groth16Prover::from_key_store(&store, circuits)
        .await
        .with_context(|| format!("run `zk-ballot setup --keys-dir {:?}` first", keys_dir))?;
    let verifier = Groth16Verifier::from_key_store(&store, circuits).await?;
    Ok(ProofBridge::new(CommitmentScheme::poseidon(), Arc::new(prover), Arc::new(verifier)))
}

async fn run_prove_vote(keys_dir: PathBuf, secret: String, option: u32, salt: Option<String>) -> Result<()> {
    let bridge = load_bridge(&keys_dir, &[CircuitId::Vote]).await?;
    let secret = parse_field("secret", &secret)?;
    let salt = match salt {
        Some(value) => parse_field("salt", &value)?,
        None => FieldElement::random(&mut rand::thread_rng()),
    };

    let ballot = bridge.prove_vote(&secret, option, &salt)?;
    // keep the salt, the reveal needs it
    let output = json!({ "salt": salt, "ballot": ballot });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run_prove_reveal(keys_dir: PathBuf, secret: String, option: u32, salt: String) -> Result<()> {
    let bridge = load_bridge(&keys_dir, &[CircuitId::Reveal]).await?;
    let secret = parse_field("secret", &secret)?;
    let salt = parse_field("salt", &salt)?;

    let ballot = bridge.prove_reveal(&secret, option, &salt)?;
    println!("{}", serde_json::to_string_pretty(&ballot)?);
    Ok(())
}

async fn run_prove_open(keys_dir: PathBuf, secret: String, option: u32) -> Result<()> {
    let bridge = load_bridge(&keys_dir, &[CircuitId::OpenBallot]).await?;
    let secret = parse_field("secret", &secret)?;

    let ballot = bridge.prove_open(&secret, option)?;
    println!("{}", serde_json::to_string_pretty(&ballot)?);
    Ok(())
}

async fn run_verify(keys_dir: PathBuf, circuit: String, proof: PathBuf, signals: String, snarkjs: bool) -> Result<()> {
    let circuit: CircuitId = circuit.parse()?;
    let store = CircuitKeyStore::new(&keys_dir);
    let verifier = Groth16Verifier::from_key_store(&store, &[circuit]).await?;

    let signals = signals
        .split(',')
        .map(|s| FieldElement::from_canonical_decimal(s.trim()))
        .collect::<zk_ballot::Result<Vec<_>>>()?;

    let json = tokio::fs::read_to_string(&proof)
        .await
        .with_context(|| format!("reading {:?}", proof))?;
    let valid = if snarkjs {
        let proof: SnarkProof = serde_json::from_str(&json)?;
        verifier.verify_snark(circuit, &signals, &proof)?
    } else {
        let proof: ContractProof = serde_json::from_str(&json)?;
        verifier.verify(circuit, &signals, &proof)?
    };

    println!("{}", json!({ "circuit": circuit, "valid": valid }));
    if !valid {
        bail!("{} proof did not verify", circuit);
    }
    Ok(())
}

async fn ensure_keys(store: &CircuitKeyStore, circuits: &[CircuitId]) -> Result<()> {
    let mut rng = StdRng::from_entropy();
    for circuit in circuits {
        if !store.keys_exist(*circuit).await {
            store.setup_circuit(*circuit, &mut rng).await?;
        }
    }
    Ok(())
}

async fn run_simulation(
    config: Option<PathBuf>,
    keys_dir: PathBuf,
    mode: SimulationMode,
    options: u32,
    voters: usize,
) -> Result<()> {
    let config = match config {
        Some(path) => ElectionConfig::load(path).await?,
        None => {
            let mode = match mode {
                SimulationMode::CommitReveal => ElectionMode::CommitReveal,
                SimulationMode::OpenBallot => ElectionMode::OpenBallot { voting_duration_secs: 3600 },
            };
            let mut config = ElectionConfig::new("admin", options, mode);
            config.keys_dir = keys_dir;
            config
        }
    };
    config.validate()?;

    let circuits: &[CircuitId] = match config.mode {
        ElectionMode::CommitReveal => &[CircuitId::Vote, CircuitId::Reveal],
        ElectionMode::OpenBallot { .. } => &[CircuitId::OpenBallot],
    };
    let store = CircuitKeyStore::new(&config.keys_dir);
    ensure_keys(&store, circuits).await?;

    let prover = Groth16Prover::from_key_store(&store, circuits).await?;
    let verifier: Arc<dyn ProofVerifier> = Arc::new(Groth16Verifier::from_key_store(&store, circuits).await?);
    let bridge = ProofBridge::new(CommitmentScheme::poseidon(), Arc::new(prover), verifier.clone());

    let admin: Principal = config.admin.clone();
    let clock = ManualClock::new(SystemClock.now());
    let mut election = Election::from_config(&config, verifier, Arc::new(clock.clone()))?;

    let mut rng = rand::thread_rng();
    let ballots: Vec<(FieldElement, u32, FieldElement)> = (0..voters)
        .map(|_| {
            (
                FieldElement::random(&mut rng),
                rng.gen_range(1..=config.options_count),
                FieldElement::random(&mut rng),
            )
        })
        .collect();

    let commitments = ballots
        .iter()
        .map(|(secret, _, _)| bridge.scheme().derive_commitment(secret))
        .collect::<zk_ballot::Result<Vec<_>>>()?;
    election.batch_register_voters(&admin, &commitments)?;

    match config.mode {
        ElectionMode::CommitReveal => {
            election.change_state(&admin, Phase::Voting)?;
            for (secret, option, salt) in &ballots {
                let ballot = bridge.prove_vote(secret, *option, salt)?;
                election.cast_hidden_vote(&ballot)?;
            }

            election.change_state(&admin, Phase::Revealing)?;
            for (secret, option, salt) in &ballots {
                let reveal = bridge.prove_reveal(secret, *option, salt)?;
                election.reveal_vote_with_proof(&reveal)?;
            }

            election.change_state(&admin, Phase::Ended)?;
        }
        ElectionMode::OpenBallot { voting_duration_secs } => {
            for (secret, option, _) in &ballots {
                let ballot = bridge.prove_open(secret, *option)?;
                election.cast_open_vote(&ballot)?;
            }

            clock.advance(voting_duration_secs);
            election.reveal_results(&admin)?;
        }
    }

    let results = election.get_results()?;
    info!("📊 Election finished with {} audited events", election.events().len());
    println!("{}", serde_json::to_string_pretty(&json!({ "mode": config.mode, "results": results }))?);
    Ok(())
}
