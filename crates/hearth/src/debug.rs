use crate::DeviceMode;
use iggy::client::producer::ProducerOptions;
use iggy::client::tcp_client::TcpClient;
use iggy::client::tcp_client::TcpClientConfig;
use iggy::client::Client;
use iggy::client::MessageClient;
use iggy::client::StreamClient;
use iggy::models::message::{Message, Messages, PartitionId};
use iggy::models::stream::{Stream, StreamId};
use iggy::models::topic::{Topic, TopicId};
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::runtime::Runtime;
use tokio::sync::mpsc::{self, Sender};

/// Configuration for the heater control debugger
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// URL of the iggy server
    pub iggy_url: String,
    /// Stream name for debugging data
    pub stream_name: String,
    /// Topic name for this model's control events
    pub topic_name: String,
    /// Unique ID for this model instance
    pub model_id: String,
    /// Optional sampling rate (in Hz) for debug data
    pub sample_rate_hz: Option<f64>,
}

impl Default for DebugConfig {
    fn default() -> Self {
        DebugConfig {
            iggy_url: "127.0.0.1:8090".to_string(),
            stream_name: "hearth_debug".to_string(),
            topic_name: "control_events".to_string(),
            model_id: format!("heater_{}", rand::random::<u32>()),
            sample_rate_hz: None,
        }
    }
}

/// Snapshot of the model state after an accepted control event
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ControlDebugData {
    /// Timestamp in milliseconds since UNIX epoch
    pub timestamp: u128,
    /// Model ID
    pub model_id: String,
    /// Temperature after rounding and clamping, °C
    pub temperature: f64,
    /// Power mode
    pub mode: DeviceMode,
    /// Normalized gradient stop position in [0, 1]
    pub gradient_position: f64,
}

/// Control-event debugger that sends data to iggy
pub struct ControlDebugger {
    config: DebugConfig,
    tx: Sender<ControlDebugData>,
    last_sample: Instant,
    sample_interval: Option<Duration>,
}

impl ControlDebugger {
    /// Create a new control-event debugger
    pub fn new(config: DebugConfig) -> Self {
        let (tx, mut rx) = mpsc::channel::<ControlDebugData>(100);

        // Clone values for the background thread
        let iggy_url = config.iggy_url.clone();
        let stream_name = config.stream_name.clone();
        let topic_name = config.topic_name.clone();

        // Set up sample interval if specified
        let sample_interval = config
            .sample_rate_hz
            .map(|rate| Duration::from_secs_f64(1.0 / rate));

        // Start background thread to handle sending messages to iggy
        thread::spawn(move || {
            let rt = match Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    eprintln!("Failed to start debug runtime: {}", e);
                    return;
                }
            };
            rt.block_on(async {
                let client_config = TcpClientConfig::default();
                let mut client = TcpClient::new(client_config);

                // Connect to the iggy server
                if let Err(e) = client.connect(&iggy_url).await {
                    eprintln!("Failed to connect to iggy server: {}", e);
                    return;
                }

                // Create stream and topic if they don't exist
                ensure_stream_and_topic(&mut client, &stream_name, &topic_name).await;

                // Process messages from channel
                while let Some(debug_data) = rx.recv().await {
                    let payload = match serde_json::to_vec(&debug_data) {
                        Ok(payload) => payload,
                        Err(e) => {
                            eprintln!("Error serializing debug data: {}", e);
                            continue;
                        }
                    };

                    // Send to iggy
                    let messages = Messages::from(vec![Message::new(payload)]);
                    if let Err(e) = client
                        .send_messages(
                            &StreamId::from_name(&stream_name),
                            &TopicId::from_name(&topic_name),
                            &PartitionId::from(0),
                            &messages,
                            &ProducerOptions::default(),
                        )
                        .await
                    {
                        eprintln!("Error sending debug data: {}", e);
                    }
                }
            });
        });

        ControlDebugger {
            config,
            tx,
            last_sample: Instant::now(),
            sample_interval,
        }
    }

    /// Send a snapshot of the model state
    pub fn send_debug_data(&mut self, temperature: f64, mode: DeviceMode, gradient_position: f64) {
        // Check if we should sample based on rate
        if let Some(interval) = self.sample_interval {
            let now = Instant::now();
            if now.duration_since(self.last_sample) < interval {
                return;
            }
            self.last_sample = now;
        }

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let debug_data = ControlDebugData {
            timestamp,
            model_id: self.config.model_id.clone(),
            temperature,
            mode,
            gradient_position,
        };

        // Send to background thread
        if let Err(e) = self.tx.try_send(debug_data) {
            eprintln!("Failed to send debug data: {}", e);
        }
    }
}

/// Ensure that the stream and topic exist on the iggy server
async fn ensure_stream_and_topic(client: &mut TcpClient, stream_name: &str, topic_name: &str) {
    // Try to create the stream (ignore if it already exists)
    let _ = client
        .create_stream(&Stream::new(stream_name, "Heater Control Debug Data"))
        .await;

    // Try to create the topic (ignore if it already exists)
    let _ = client
        .create_topic(
            &StreamId::from_name(stream_name),
            &Topic::new(topic_name, 1, None), // 1 partition
        )
        .await;
}
