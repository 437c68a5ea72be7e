pub mod perf_analyzer;
