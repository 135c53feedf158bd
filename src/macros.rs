/// Times `$code`, records the elapsed seconds in `$histogram` and yields the
/// block's value.
#[macro_export]
macro_rules! measure {
    ($histogram:expr, $code:block) => {{
        let timer = $histogram.start_timer();
        let result = $code;
        timer.observe_duration();
        result
    }};
}
