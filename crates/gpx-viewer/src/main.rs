fn main() {
    gpx_viewer::run_native();
}
