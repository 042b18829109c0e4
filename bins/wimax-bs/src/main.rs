use clap::Parser;

use rand::{Rng, SeedableRng, rngs::StdRng};

use wimax_config::{toml_config, StationConfig};
use wimax_core::{BitBuffer, Cid, Direction};
use wimax_mac::{
    ArqEngine, CodingScheme, Discipline, MgmtTier, RangingCodeType, RangingRecord, RxOutcome,
    ServiceFlow, SubframeScheduler,
};
use wimax_pdus::arq::FragSubheader;
use wimax_pdus::phy::{Fch, PhySyncField};

/// Load configuration file
fn load_config_from_toml(cfg_path: &str) -> StationConfig {
    match toml_config::from_file(cfg_path) {
        Ok(c) => c,
        Err(e) => {
            println!("Failed to load configuration from {}: {}", cfg_path, e);
            std::process::exit(1);
        }
    }
}

/// Admit the connections provisioned in the configuration.
fn build_scheduler(cfg: &StationConfig) -> SubframeScheduler {
    let mut sched = SubframeScheduler::new(cfg.clone());
    for f in &cfg.flows {
        // coding codes are bounded by validate()
        let Some(coding) = CodingScheme::from_code(f.coding_code) else {
            continue;
        };
        let discipline = if f.strict {
            Discipline::StrictPriority
        } else {
            Discipline::WeightedFair { weight: f.weight }
        };
        let arq = f.arq.then(|| ArqEngine::new(f.cid, cfg.arq));
        sched.queues.admit_flow(ServiceFlow::new(
            f.cid,
            f.direction,
            discipline,
            coding,
            f.profile_code,
            arq,
        ));
    }
    sched
}

/// Encode the frame-start broadcast: sync field, FCH, then the DL-MAP IEs
fn encode_frame_header(sched: &SubframeScheduler, cfg: &StationConfig, dl_ies: &[wimax_pdus::phy::DlMapIe]) -> Vec<u8> {
    let mut buf = BitBuffer::new_autoexpand(256);
    PhySyncField {
        duration_code: cfg.frame_duration.code(),
        frame_number: sched.frame_number(),
    }
    .to_bitbuf(&mut buf);
    Fch {
        preamble: 0,
        used_subchannel_map: 0x3F,
        rep_coding_indication: 0,
        range_change_indication: false,
        coding_indication: 0,
        dl_map_length: dl_ies.len() as u8,
    }
    .to_bitbuf(&mut buf);
    for ie in dl_ies {
        ie.to_bitbuf(&mut buf);
    }
    buf.into_bytes()
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "OFDMA base-station MAC exerciser",
    long_about = "Runs the MAC scheduler and ARQ engine over a simulated lossy air interface using the provided TOML configuration"
)]
struct Args {
    /// Config file (required)
    #[arg(help = "TOML config with frame/ranging/arq parameters")]
    config: String,

    /// Number of frames to run
    #[arg(long, default_value_t = 1000)]
    frames: u32,

    /// Downlink burst loss: one in N bursts is dropped (0 = lossless)
    #[arg(long, default_value_t = 10)]
    loss_one_in: u32,

    /// Seed for the traffic and loss generators
    #[arg(long, default_value_t = 0x80216)]
    seed: u64,
}

fn main() {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cfg = load_config_from_toml(&args.config);
    if let Err(e) = cfg.validate() {
        println!("Invalid configuration: {}", e);
        std::process::exit(1);
    }
    tracing::info!(
        "starting: {:?} frames, dl grid {}x{}, ul grid {}x{}",
        cfg.frame_duration,
        cfg.num_dl_symbols,
        cfg.num_dl_subchannels,
        cfg.num_ul_symbols,
        cfg.num_ul_subchannels
    );

    // The exercised path needs one ARQ-protected downlink connection; an
    // uplink flow just adds grant traffic when present.
    let Some(dl_cid) = cfg.flows.iter().find(|f| f.direction == Direction::Dl && f.arq).map(|f| f.cid)
    else {
        println!("Configuration must provision a downlink flow with arq = true");
        std::process::exit(1);
    };
    let ul_cid: Option<Cid> =
        cfg.flows.iter().find(|f| f.direction == Direction::Ul).map(|f| f.cid);

    let mut sched = build_scheduler(&cfg);
    let mut peer = ArqEngine::new(dl_cid, cfg.arq);
    let mut rng = StdRng::seed_from_u64(args.seed);

    let mut sdus_offered = 0u64;
    let mut sdus_delivered = 0u64;
    let mut bursts_lost = 0u64;
    let mut dl_ps_idle = 0u64;

    for frame in 0..args.frames {
        // Periodic channel descriptors on the broadcast tier
        if frame % 20 == 0 {
            sched.queues.enqueue_mgmt(MgmtTier::Broadcast, vec![0xDC; 96]);
        }

        // Offered traffic: a couple of downlink SDUs per frame when the
        // ARQ window has room, plus uplink demand now and then.
        for _ in 0..2 {
            let len = rng.random_range(60..400);
            let sdu = vec![rng.random::<u8>(); len];
            let flow = sched.queues.flow_mut(dl_cid).unwrap();
            if flow.enqueue_sdu(sdu).is_ok() {
                sdus_offered += 1;
            }
        }
        if let Some(ul_cid) = ul_cid {
            if rng.random_range(0..4u8) == 0 {
                let flow = sched.queues.flow_mut(ul_cid).unwrap();
                let _ = flow.enqueue_sdu(vec![0; rng.random_range(40..200)]);
            }
        }
        if rng.random_range(0..16u8) == 0 {
            sched.ranging.push_heard(RangingRecord {
                code: rng.random::<u8>(),
                code_type: if rng.random_range(0..2u8) == 0 {
                    RangingCodeType::Periodic
                } else {
                    RangingCodeType::BandwidthRequest
                },
                frame_number: sched.frame_number(),
                symbol: 0,
                subchannel: cfg.num_ul_subchannels as u8 - 1,
                response_sent: false,
            });
        }

        let dl = match sched.schedule_downlink() {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("downlink scheduling failed: {}", e);
                std::process::exit(1);
            }
        };
        let ul = match sched.schedule_uplink() {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("uplink scheduling failed: {}", e);
                std::process::exit(1);
            }
        };

        let dl_ies: Vec<_> = dl.grants.iter().map(|g| g.ie).collect();
        let header = encode_frame_header(&sched, &cfg, &dl_ies);
        tracing::trace!(
            "frame {}: {} byte header, {} dl bursts, {} ul ies",
            sched.frame_number(),
            header.len(),
            dl.grants.len(),
            ul.ies.len()
        );

        // Air interface: hand ARQ bursts to the peer, minus losses
        for grant in &dl.grants {
            if grant.cid != dl_cid {
                continue;
            }
            if args.loss_one_in > 0 && rng.random_range(0..args.loss_one_in) == 0 {
                bursts_lost += 1;
                continue;
            }
            let mut buf = BitBuffer::from_bytes(&grant.payload);
            match FragSubheader::from_bitbuf(&mut buf) {
                Ok(sub) => {
                    let body = grant.payload[2..].to_vec();
                    if let RxOutcome::Delivered(sdus) = peer.on_receive(sub.fc, sub.bsn, body) {
                        sdus_delivered += sdus.len() as u64;
                    }
                }
                Err(e) => tracing::warn!("malformed arq burst: {}", e),
            }
        }

        // Feedback comes back on the uplink every frame
        if let Some(fb) = peer.build_feedback() {
            let engine = sched.queues.flow_mut(dl_cid).unwrap().arq.as_mut().unwrap();
            let outcome = engine.on_feedback(&fb);
            for bsn in &outcome.dropped_bsns {
                tracing::warn!("gave up on block {}", bsn);
            }
            if let Some(discard) = outcome.discard {
                peer.on_discard(&discard);
            }
            if engine.peek_transmit().is_none() && engine.outstanding() > 0 {
                engine.on_retry_timeout();
            }
        }

        dl_ps_idle += u64::from(dl.unused_ps);
        sched.advance_frame();
    }

    tracing::info!(
        "done after {} frames: {} sdus offered, {} delivered, {} bursts lost, avg {} dl ps idle",
        args.frames,
        sdus_offered,
        sdus_delivered,
        bursts_lost,
        dl_ps_idle / u64::from(args.frames.max(1))
    );
}
