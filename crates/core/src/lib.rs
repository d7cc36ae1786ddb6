//! Chunked face analysis of videos into a social-interaction graph.
//!
//! Each bounded context keeps its pure logic under `domain` and its
//! ffmpeg, ONNX and filesystem adapters under `infrastructure`.

pub mod shared {
    pub mod config;
    pub mod constants;
    pub mod embedding;
    pub mod error;
    pub mod face_box;
    pub mod file_store;
    pub mod frame;
    pub mod model_resolver;
    pub mod video_metadata;
}

pub mod video {
    pub mod domain {
        pub mod chunk;
        pub mod chunk_decoder;
        pub mod frame_sampler;
        pub mod image_codec;
        pub mod video_reader;
        pub mod video_segmenter;
        pub mod video_transcoder;
        pub mod video_writer;
    }
    pub mod infrastructure;
}

pub mod detection {
    pub mod domain {
        pub mod chunk_deduplicator;
        pub mod face_detector;
        pub mod face_encoder;
        pub mod face_locator;
        pub mod face_observation;
        pub mod face_quality;
        pub mod scaled_face_detector;
    }
    pub mod infrastructure;
}

pub mod identity {
    pub mod domain {
        pub mod identity;
        pub mod identity_matcher;
        pub mod identity_pool;
        pub mod identity_seeder;
        pub mod identity_store;
    }
    pub mod infrastructure;
}

pub mod interaction {
    pub mod domain {
        pub mod face_crop;
        pub mod interaction_aggregator;
    }
}

pub mod storage {
    pub mod domain {
        pub mod object_store;
        pub mod search_index;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod analysis_notifier;
    pub mod analysis_store;
    pub mod analyze_video_use_case;
    pub mod detection_executor;
    pub mod pipeline_logger;
    pub mod pipeline_state;
    pub mod video_analysis;
    pub mod infrastructure;
}
