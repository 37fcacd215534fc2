use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use webrtc::{
    api::{APIBuilder, interceptor_registry::register_default_interceptors, media_engine::MediaEngine},
    ice_transport::ice_server::RTCIceServer,
    interceptor::registry::Registry,
    peer_connection::{
        RTCPeerConnection, configuration::RTCConfiguration,
        peer_connection_state::RTCPeerConnectionState,
        sdp::session_description::RTCSessionDescription,
    },
    rtp_transceiver::{
        RTCRtpTransceiverInit, rtp_codec::RTPCodecType,
        rtp_transceiver_direction::RTCRtpTransceiverDirection,
    },
    track::track_remote::TrackRemote,
};

use super::{MediaSession, MediaStack, MediaStream, TrackKind, TransportEvent};
use crate::{Error, Result, config::MediaConfig};

const EVENT_CHANNEL_DEPTH: usize = 32;

/// Production media stack: one receive-only peer connection per camera.
pub struct WebRtcStack {
    config: MediaConfig,
}

impl WebRtcStack {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl MediaStack for WebRtcStack {
    async fn open(&self, camera_id: &str) -> Result<Box<dyn MediaSession>> {
        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(|e| Error::Media(e.to_string()))?;

        let mut registry = Registry::new();
        registry = register_default_interceptors(registry, &mut media_engine)
            .map_err(|e| Error::Media(e.to_string()))?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: vec![RTCIceServer {
                urls: self.config.stun_servers.clone(),
                ..Default::default()
            }],
            ..Default::default()
        };

        let peer = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .map_err(|e| Error::Media(e.to_string()))?,
        );

        for kind in [RTPCodecType::Video, RTPCodecType::Audio] {
            peer.add_transceiver_from_kind(
                kind,
                Some(RTCRtpTransceiverInit {
                    direction: RTCRtpTransceiverDirection::Recvonly,
                    send_encodings: Vec::new(),
                }),
            )
            .await
            .map_err(|e| Error::Media(e.to_string()))?;
        }

        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_DEPTH);
        wire_callbacks(&peer, camera_id, events_tx);

        debug!(camera_id, "Opened peer connection");
        Ok(Box::new(WebRtcSession {
            peer,
            events: Some(events_rx),
        }))
    }
}

fn wire_callbacks(
    peer: &Arc<RTCPeerConnection>,
    camera_id: &str,
    events_tx: mpsc::Sender<TransportEvent>,
) {
    let track_tx = events_tx.clone();
    let track_camera = camera_id.to_string();
    peer.on_track(Box::new(move |track: Arc<TrackRemote>, _receiver, _transceiver| {
        let tx = track_tx.clone();
        let camera_id = track_camera.clone();
        Box::pin(async move {
            let kind = match track.kind() {
                RTPCodecType::Audio => TrackKind::Audio,
                _ => TrackKind::Video,
            };
            debug!(camera_id = %camera_id, ?kind, ssrc = track.ssrc(), "Remote track arrived");

            let stream = Arc::new(RemoteStream {
                id: format!("{camera_id}/{}", track.ssrc()),
            });
            let _ = tx.send(TransportEvent::Track { kind, stream }).await;

            // Drain RTP so the track keeps flowing; the first packet doubles
            // as the media-is-live signal.
            let flowing = AtomicBool::new(false);
            while let Ok((_packet, _attrs)) = track.read_rtp().await {
                if !flowing.swap(true, Ordering::Relaxed) {
                    let _ = tx.send(TransportEvent::FrameFlowing).await;
                }
            }
        })
    }));

    let state_tx = events_tx;
    let state_camera = camera_id.to_string();
    peer.on_peer_connection_state_change(Box::new(move |state: RTCPeerConnectionState| {
        let tx = state_tx.clone();
        let camera_id = state_camera.clone();
        Box::pin(async move {
            debug!(camera_id = %camera_id, ?state, "Peer connection state changed");
            // Closed is the session tearing itself down, not a fault.
            if matches!(
                state,
                RTCPeerConnectionState::Disconnected | RTCPeerConnectionState::Failed
            ) {
                let _ = tx.send(TransportEvent::ConnectivityLost).await;
            }
        })
    }));
}

struct WebRtcSession {
    peer: Arc<RTCPeerConnection>,
    events: Option<mpsc::Receiver<TransportEvent>>,
}

#[async_trait]
impl MediaSession for WebRtcSession {
    async fn create_offer(&mut self, gather_timeout: Duration) -> Result<String> {
        let offer = self
            .peer
            .create_offer(None)
            .await
            .map_err(|e| Error::Media(e.to_string()))?;

        let mut gathered = self.peer.gathering_complete_promise().await;
        self.peer
            .set_local_description(offer)
            .await
            .map_err(|e| Error::Media(e.to_string()))?;

        // Bounded wait; a partial candidate set is still a usable offer.
        if tokio::time::timeout(gather_timeout, gathered.recv())
            .await
            .is_err()
        {
            warn!("Candidate gathering timed out, sending partial offer");
        }

        let local = self
            .peer
            .local_description()
            .await
            .ok_or_else(|| Error::Media("No local description after gathering".to_string()))?;
        Ok(local.sdp)
    }

    async fn apply_answer(&mut self, answer: &str) -> Result<()> {
        let answer = RTCSessionDescription::answer(answer.to_string())
            .map_err(|e| Error::Media(e.to_string()))?;
        self.peer
            .set_remote_description(answer)
            .await
            .map_err(|e| Error::Media(e.to_string()))
    }

    fn take_events(&mut self) -> Option<mpsc::Receiver<TransportEvent>> {
        self.events.take()
    }

    async fn close(&mut self) {
        if let Err(e) = self.peer.close().await {
            warn!(error = %e, "Error closing peer connection");
        }
    }
}

/// Renderer-facing handle for a remote RTP track. Frame decoding happens in
/// the rendering layer, so capture has nothing to offer from here.
struct RemoteStream {
    id: String,
}

impl MediaStream for RemoteStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn capture_frame(&self) -> Option<Vec<u8>> {
        None
    }
}
